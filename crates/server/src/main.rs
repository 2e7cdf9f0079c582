mod bootstrap;
mod health;
mod receive;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use quotebot_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "quotebot-server",
    about = "Slack slash-command quote responder",
    after_help = "Examples:\n  quotebot-server --secret $SLACK_SIGNING_KEY\n  quotebot-server --config quotebot.toml --port 8080"
)]
struct Args {
    #[arg(long, help = "Slack signing secret used to verify incoming requests")]
    secret: Option<String>,
    #[arg(long, help = "Path to a quotebot.toml configuration file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Path to the quote dataset (JSON or TOML)")]
    quotes: Option<PathBuf>,
    #[arg(long, help = "Port to listen on")]
    port: Option<u16>,
    #[arg(long, help = "Slack Web API base URL, e.g. a local mock")]
    slack_api_base_url: Option<String>,
    #[arg(long, help = "Log level: trace|debug|info|warn|error")]
    log_level: Option<String>,
}

impl Args {
    fn into_load_options(self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config,
            overrides: ConfigOverrides {
                signing_secret: self.secret,
                quotes_path: self.quotes,
                port: self.port,
                api_base_url: self.slack_api_base_url,
                log_level: self.log_level,
                ..ConfigOverrides::default()
            },
        }
    }
}

fn init_logging(config: &AppConfig) {
    use quotebot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run(Args::parse()).await
}

async fn run(args: Args) -> Result<()> {
    // Logging depends on config, so config errors surface through anyhow only.
    let config = AppConfig::load(args.into_load_options())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        address = %address,
        "quotebot-server listening"
    );

    axum::serve(listener, app.router()).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "quotebot-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}
