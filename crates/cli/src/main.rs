//! Deskmate CLI, the main entry point.
//!
//! Commands:
//! - `onboard` - Write a default config file
//! - `serve`   - Start the HTTP/WebSocket gateway
//! - `chat`    - Interactive chat or single-message mode
//! - `tools`   - Print the tool catalog
//! - `doctor`  - Diagnose configuration and credentials

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskmate",
    about = "Deskmate: a chat assistant that acts on your Google workspace",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Onboard,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation session to use
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// List the tools the assistant can call
    Tools,

    /// Diagnose configuration and credentials
    Doctor,
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message, session } => commands::chat::run(message, session).await?,
        Commands::Tools => commands::tools::run(),
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
