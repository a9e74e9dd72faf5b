//! `deskmate serve`: start the HTTP/WebSocket gateway.

use anyhow::Context as _;
use deskmate_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load().context("failed to load config")?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Deskmate Gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);
    if !config.has_api_key() {
        println!("   Warning:   no API key configured, every turn will fail");
    }

    deskmate_gateway::start(config).await
}
