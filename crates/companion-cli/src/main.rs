mod chat;
mod config;

use clap::{Parser, Subcommand};
use companion_agent::{build_backend, classify, ConversationalAgent, TaskContext};
use companion_gateway::{AppState, AuthConfig, GatewayServer};
use companion_session::SessionRegistry;
use config::CompanionConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "companion", about = "Companion: a calm helper for getting through everyday tasks")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "companion.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Talk to the companion in the terminal
    Chat {
        /// Task to work on
        #[arg(short, long)]
        task: Option<String>,
        /// Current step of the task
        #[arg(short, long)]
        action: Option<String>,
        /// How the companion should address you
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print the intent label for a piece of text
    Classify {
        /// Text to classify
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    if let Commands::Classify { text } = &cli.command {
        println!("{}", classify(text));
        return Ok(());
    }

    let mut config = CompanionConfig::load(&cli.config)?;
    config.model.resolve_api_key()?;
    let backend = build_backend(&config.model)?;
    info!(
        provider = ?config.model.provider,
        model = %config.model.model_id,
        "Generation backend ready"
    );

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let sessions = Arc::new(
                SessionRegistry::new(backend, config.agent_settings())
                    .with_key_policy(config.sessions.key_policy())
                    .with_eviction(config.sessions.eviction()),
            );
            let _sweeper = sessions.spawn_sweeper(config.sessions.sweep_interval());

            let auth = AuthConfig::new(config.server.api_keys.clone());
            if auth.is_enabled() {
                info!(keys = auth.api_keys.len(), "API key auth enabled");
            }

            let state = AppState::new(sessions)
                .with_generation_timeout(config.conversation.generation_timeout());
            let app = GatewayServer::build_with_auth(state, auth);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!("Companion listening on {addr}");
            axum::serve(listener, app).await?;
        }
        Commands::Chat { task, action, name } => {
            let mut agent =
                ConversationalAgent::new(backend, config.agent_settings(), task.as_deref());
            let mut context = TaskContext::new();
            if let Some(action) = action {
                context = context.with_action(action);
            }
            if let Some(name) = name {
                context = context.with_user_name(name);
            }
            chat::run_chat(
                &mut agent,
                &context,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
                config.conversation.generation_timeout(),
            )
            .await?;
        }
        Commands::Classify { .. } => {}
    }

    Ok(())
}
