use clap::{Parser, Subcommand};
use std::path::PathBuf;

use playlist_relay::{
    auth::{CredentialStore, OAuthClient, OAuthConfig},
    config::AppConfig,
    logging, server,
};

#[derive(Parser)]
#[command(name = "playlist-relay")]
#[command(
    about = "Keeps the streaming provider's client secret off the browser",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml", env = "RELAY_CONFIG")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Start {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the provider authorization URL
    AuthUrl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse();

    // Load configuration
    let mut config = AppConfig::load(&cli.config)?;

    logging::init(&config.server.log_level);

    match cli.command {
        Commands::Start { port } => {
            // Override port if specified
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!(
                "Starting playlist relay on {}:{}",
                config.server.host,
                config.server.port
            );
            tracing::info!("Serving static files from {}", config.server.public_dir);
            tracing::info!("After login, browsers go to {}", config.post_login_redirect_target);

            server::start_server(config).await?;
        }
        Commands::AuthUrl => {
            let client = OAuthClient::new(
                OAuthConfig::from(&config.provider),
                CredentialStore::new(),
                reqwest::Client::new(),
            );
            println!("{}", client.authorization_url()?);
        }
    }

    Ok(())
}
