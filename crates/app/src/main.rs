//! Colloquy - terminal client for moderated discussion rooms
//!
//! `colloquy rooms` watches the live room list; `colloquy join <room>`
//! takes part in one discussion through its rating round.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colloquy_core::SessionContext;
use colloquy_net::{DirectoryClient, DiscussionClient, Endpoint, HttpRatingSubmitter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod discussion;
mod error;
mod render;
mod rooms;

use config::AppConfig;
use error::AppError;

#[derive(Parser, Debug)]
#[command(name = "colloquy", version, about = "Terminal client for moderated discussion rooms")]
struct Cli {
    /// Config file (default: colloquy.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server `host[:port]`, overrides the config file
    #[arg(long, global = true)]
    host: Option<String>,

    /// Use wss/https
    #[arg(long, global = true)]
    secure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the live room list
    Rooms {
        #[arg(long, default_value_t = 0)]
        topic: u32,
        #[arg(long, default_value_t = 0)]
        subtopic: u32,
        /// Hide rooms that cannot be joined
        #[arg(long)]
        joinable: bool,
    },
    /// Join a discussion room
    Join {
        room: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long)]
        username: Option<String>,
        /// Bearer token for rating submission
        #[arg(long, env = "COLLOQUY_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

fn endpoint(cli: &Cli, config: &AppConfig) -> Endpoint {
    let mut endpoint = config.endpoint();
    if let Some(host) = &cli.host {
        endpoint = Endpoint::new(host.clone(), endpoint.secure);
    }
    if cli.secure {
        endpoint.secure = true;
    }
    endpoint
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let endpoint = endpoint(&cli, &config);
    tracing::debug!(host = %endpoint.host, secure = endpoint.secure, "Using server");

    match cli.command {
        Command::Rooms {
            topic,
            subtopic,
            joinable,
        } => {
            let client = DirectoryClient::connect(&endpoint).await?;
            rooms::run(client, topic, subtopic, joinable).await
        }
        Command::Join {
            room,
            password,
            username,
            token,
        } => {
            let username = username
                .or(config.user.username)
                .filter(|name| !name.trim().is_empty())
                .ok_or(AppError::MissingUsername)?;
            let client = DiscussionClient::connect(&endpoint, &room, &username, &password).await?;
            let submitter = Arc::new(HttpRatingSubmitter::new(endpoint, token));
            let context = SessionContext {
                room_id: room,
                username,
            };
            discussion::run(client, context, submitter).await
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting Colloquy");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
