//! `deskmate chat`: interactive or single-message chat.

use anyhow::{Context as _, bail};
use deskmate_agent::{ChatService, ReplyKind};
use deskmate_config::AppConfig;
use deskmate_core::message::ConversationId;
use std::io::Write as _;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_missing_key_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    DESKMATE_API_KEY=...");
    eprintln!("    AI_API_KEY=...");
    eprintln!("    OPENROUTER_API_KEY=sk-or-v1-...   (recommended)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

pub async fn run(message: Option<String>, session: String) -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load config")?;

    // Check for API key early; give a clear error
    if !config.has_api_key() {
        print_missing_key_help();
        bail!("no API key found, see above for setup instructions");
    }

    let service = deskmate_gateway::build_chat_service(&config)?;
    let session = ConversationId::from(session.as_str());

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = service.chat(&session, &msg).await?;
        eprint!("\r              \r");
        println!("{}", reply.reply);
        return Ok(());
    }

    interactive(&service, &session, &config).await
}

async fn interactive(service: &ChatService, session: &ConversationId, config: &AppConfig) -> anyhow::Result<()> {
    println!();
    println!("  Deskmate - Interactive Mode");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", service.agent().registry().catalog().len());
    println!("  Session:   {session}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/clear' to forget this session, 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                service.clear(session).await?;
                println!("  (history cleared)");
                continue;
            }
            _ => {}
        }

        eprint!("  ...");
        let reply = service.chat(session, input).await?;
        eprint!("\r     \r");

        let prefix = match reply.kind {
            ReplyKind::Message => "Deskmate",
            ReplyKind::Error => "Deskmate (error)",
        };
        println!();
        for (i, line) in reply.reply.lines().enumerate() {
            if i == 0 {
                println!("  {prefix} > {line}");
            } else {
                println!("  {line}");
            }
        }
        println!();
    }

    println!("  Goodbye!");
    Ok(())
}
