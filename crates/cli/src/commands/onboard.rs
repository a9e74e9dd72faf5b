//! `deskmate onboard`: first-time setup.

use deskmate_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Deskmate - First-Time Setup");
    println!("===========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Created config.toml at: {}", config_path.display());
    println!("\n  Next steps:");
    println!("   1. Edit {} and add your API key", config_path.display());
    println!("   2. Put a Google access token in `google.access_token` or point `google.token_file` at token.json");
    println!("   3. Run: deskmate doctor");
    println!("   4. Run: deskmate chat\n");

    Ok(())
}
