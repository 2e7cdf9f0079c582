//! Slack integration - slash command webhook interface
//!
//! This crate provides the Slack-facing half of quotebot:
//! - **Request signing** (`signature`) - `v0` HMAC-SHA256 verification with a replay window
//! - **Slash Commands** (`commands`) - form payload decoding and the command table/router
//! - **Responses** (`responses`) - quote selection and reply wording
//! - **Sender** (`sender`) - outbound `chat.postMessage` delivery
//!
//! # Request flow
//!
//! ```text
//! POST /receive → SecretsVerifier (gate) → CommandRouter → ResponseSelector
//!                                                              ↓
//!                                         MessageSender ← OutboundMessage
//! ```

pub mod commands;
pub mod responses;
pub mod sender;
pub mod signature;
