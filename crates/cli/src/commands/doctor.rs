//! `deskmate doctor`: diagnose configuration, credentials and the model endpoint.

use deskmate_config::AppConfig;
use deskmate_core::provider::Provider;
use deskmate_providers::OpenAiCompatProvider;

pub async fn run() -> anyhow::Result<()> {
    println!("Deskmate Doctor - System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ok    Config file found: {}", config_path.display());
    } else {
        println!("  warn  No config file, using defaults (run `deskmate onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ok    Config valid");
            config
        }
        Err(e) => {
            println!("  FAIL  Config invalid: {e}");
            println!("\n  1 issue found. Fix the config and run again.");
            return Ok(());
        }
    };

    if let Err(e) = deskmate_tools::registry::validate_catalog() {
        println!("  FAIL  Tool catalog: {e}");
        issues += 1;
    } else {
        println!("  ok    Tool catalog ({} tools)", deskmate_tools::catalog().len());
    }

    let credentials = deskmate_tools::credentials::from_config(&config.google);
    match credentials.access_token().await {
        Ok(_) => println!("  ok    Google credentials usable ({})", credentials.describe()),
        Err(e) => {
            println!("  warn  Google credentials ({}): {e}", credentials.describe());
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  ok    API key configured");
        match OpenAiCompatProvider::from_config(&config) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => println!("  ok    Model endpoint reachable: {}", provider.base_url()),
                Ok(false) | Err(_) => {
                    println!("  warn  Model endpoint not reachable: {}", provider.base_url());
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  FAIL  Model client: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  warn  No API key configured, add api_key to config.toml");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
