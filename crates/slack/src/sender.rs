use std::time::Duration;

use async_trait::async_trait;
use quotebot_core::config::SlackConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("slack http client could not be built: {0}")]
    Client(String),
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack responded with http status {0}")]
    Status(u16),
    #[error("slack rejected the message: {0}")]
    Api(String),
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, destination_id: &str, text: &str) -> Result<(), DeliveryError>;
}

/// Posts plain-text messages through the Web API's `chat.postMessage`.
pub struct SlackWebClient {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackWebClient {
    pub fn new(
        base_url: &str,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| DeliveryError::Client(error.to_string()))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned(), bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, DeliveryError> {
        Self::new(
            &config.api_base_url,
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl MessageSender for SlackWebClient {
    async fn send(&self, destination_id: &str, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessageRequest { channel: destination_id, text })
            .send()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        let body: PostMessageResponse = response
            .json()
            .await
            .map_err(|error| DeliveryError::Transport(error.to_string()))?;
        if !body.ok {
            return Err(DeliveryError::Api(body.error.unwrap_or_else(|| "unknown_error".to_owned())));
        }

        debug!(destination_id, "chat.postMessage accepted");
        Ok(())
    }
}
