use std::collections::HashMap;

use quotebot_core::config::CommandsConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::responses::{OutboundMessage, ResponseSelector};

/// Form fields Slack posts for a slash command. Fields we do not use are
/// ignored when decoding.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub trigger_id: String,
}

impl SlashCommandPayload {
    pub fn from_form(body: &[u8]) -> Result<Self, CommandParseError> {
        serde_urlencoded::from_bytes(body)
            .map_err(|error| CommandParseError::MalformedPayload(error.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("malformed slash command payload: {0}")]
    MalformedPayload(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandHandler {
    RandomQuote { category: String },
    RandomQuoteByAuthor { group: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Reply(OutboundMessage),
    Unknown { command: String },
}

/// Exact-match lookup from slash command name to handler.
#[derive(Clone, Debug, Default)]
pub struct CommandTable {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandTable {
    pub fn from_config(config: &CommandsConfig) -> Self {
        Self::default()
            .with(
                config.random_quote.clone(),
                CommandHandler::RandomQuote { category: config.random_quote_category.clone() },
            )
            .with(
                config.author_quote.clone(),
                CommandHandler::RandomQuoteByAuthor { group: config.author_group.clone() },
            )
    }

    pub fn with(mut self, command: impl Into<String>, handler: CommandHandler) -> Self {
        self.handlers.insert(command.into(), handler);
        self
    }

    pub fn resolve(&self, command: &str) -> Option<&CommandHandler> {
        self.handlers.get(command)
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

pub struct CommandRouter {
    table: CommandTable,
    selector: ResponseSelector,
}

impl CommandRouter {
    pub fn new(table: CommandTable, selector: ResponseSelector) -> Self {
        Self { table, selector }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn route(&self, payload: &SlashCommandPayload) -> CommandOutcome {
        match self.table.resolve(&payload.command) {
            Some(CommandHandler::RandomQuote { category }) => {
                CommandOutcome::Reply(self.selector.random_quote(category, payload))
            }
            Some(CommandHandler::RandomQuoteByAuthor { group }) => CommandOutcome::Reply(
                self.selector.random_quote_by_author(group, author_token(&payload.text), payload),
            ),
            None => CommandOutcome::Unknown { command: payload.command.clone() },
        }
    }
}

/// First whitespace-delimited word of the command text; the rest is dropped.
pub fn author_token(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or_default()
}
