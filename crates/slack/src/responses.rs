use std::sync::Arc;

use quotebot_core::quotes::{format_author_key, format_author_listing, QuoteStore};
use quotebot_core::random::IndexSource;

use crate::commands::SlashCommandPayload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Channel(String),
    /// Direct message to the requesting user.
    User(String),
}

impl Destination {
    pub fn id(&self) -> &str {
        match self {
            Self::Channel(id) | Self::User(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Channel(_) => "channel",
            Self::User(_) => "user",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: Destination,
    pub text: String,
}

impl OutboundMessage {
    fn to_channel(payload: &SlashCommandPayload, text: String) -> Self {
        Self { destination: Destination::Channel(payload.channel_id.clone()), text }
    }

    fn to_requester(payload: &SlashCommandPayload, text: String) -> Self {
        Self { destination: Destination::User(payload.user_id.clone()), text }
    }
}

/// Picks quotes from the store and words the reply.
#[derive(Clone)]
pub struct ResponseSelector {
    store: Arc<QuoteStore>,
    rng: Arc<dyn IndexSource>,
}

impl ResponseSelector {
    pub fn new(store: Arc<QuoteStore>, rng: Arc<dyn IndexSource>) -> Self {
        Self { store, rng }
    }

    pub fn random_quote(&self, category: &str, payload: &SlashCommandPayload) -> OutboundMessage {
        match self.store.random_from_category(category, self.rng.as_ref()) {
            Some(quote) => OutboundMessage::to_channel(payload, quote.to_owned()),
            None => OutboundMessage::to_requester(
                payload,
                format!("No quotes available in category {category}."),
            ),
        }
    }

    pub fn random_quote_by_author(
        &self,
        group: &str,
        author: &str,
        payload: &SlashCommandPayload,
    ) -> OutboundMessage {
        match self.store.random_from_author(group, author, self.rng.as_ref()) {
            Some(quote) => OutboundMessage::to_channel(
                payload,
                format!("\"{quote}\" - {}", format_author_key(author)),
            ),
            None => OutboundMessage::to_requester(
                payload,
                format!(
                    "Author {author} not found, available authors: {}",
                    format_author_listing(self.store.author_keys(group))
                ),
            ),
        }
    }
}
