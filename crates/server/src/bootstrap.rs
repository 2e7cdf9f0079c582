use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use quotebot_core::config::{AppConfig, ConfigError};
use quotebot_core::quotes::{QuoteStore, QuoteStoreError};
use quotebot_core::random::ThreadRngIndex;
use quotebot_slack::commands::{CommandRouter, CommandTable};
use quotebot_slack::responses::ResponseSelector;
use quotebot_slack::sender::{DeliveryError, SlackWebClient};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{health, receive::ReceiveState};

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<QuoteStore>,
    pub receive_state: ReceiveState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("quote dataset `{path}` could not be loaded: {source}")]
    Quotes { path: PathBuf, source: QuoteStoreError },
    #[error("slack client initialisation failed: {0}")]
    SlackClient(#[source] DeliveryError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        quotes_path = %config.quotes.path.display(),
        "starting application bootstrap"
    );

    let store = QuoteStore::load(&config.quotes.path)
        .map_err(|source| BootstrapError::Quotes { path: config.quotes.path.clone(), source })?;
    let store = Arc::new(store);
    info!(
        event_name = "system.bootstrap.quotes_loaded",
        correlation_id = "bootstrap",
        categories = store.category_names().count(),
        total_quotes = store.total_quotes(),
        "quote dataset loaded"
    );

    let sender = SlackWebClient::from_config(&config.slack).map_err(BootstrapError::SlackClient)?;
    let router = CommandRouter::new(
        CommandTable::from_config(&config.commands),
        ResponseSelector::new(store.clone(), Arc::new(ThreadRngIndex)),
    );
    for command in router.table().commands() {
        info!(
            event_name = "system.bootstrap.command_registered",
            correlation_id = "bootstrap",
            command,
            "slash command registered"
        );
    }

    let receive_state = ReceiveState {
        signing_secret: config.slack.signing_secret.clone(),
        signature_max_age_secs: config.slack.signature_max_age_secs,
        router: Arc::new(router),
        sender: Arc::new(sender),
    };

    Ok(Application { config, store, receive_state })
}

impl Application {
    pub fn router(&self) -> Router {
        crate::receive::router(self.receive_state.clone())
            .merge(health::router(self.store.clone()))
            .layer(TraceLayer::new_for_http())
    }
}
