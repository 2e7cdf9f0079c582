use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use chrono::Utc;
use quotebot_slack::{
    commands::{CommandOutcome, CommandRouter, SlashCommandPayload},
    responses::OutboundMessage,
    sender::MessageSender,
    signature::{SecretsVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ReceiveState {
    pub signing_secret: SecretString,
    pub signature_max_age_secs: u64,
    pub router: Arc<CommandRouter>,
    pub sender: Arc<dyn MessageSender>,
}

pub fn router(state: ReceiveState) -> Router {
    Router::new().route("/receive", post(receive)).with_state(state)
}

/// Slash command webhook. Every request-caused failure still answers 200 so
/// Slack does not retry; only a missing signing secret yields 500.
pub async fn receive(
    State(state): State<ReceiveState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let correlation_id = format!("REQ-{}", Uuid::new_v4().simple());

    let mut verifier = match SecretsVerifier::new(
        state.signing_secret.expose_secret(),
        header_value(&headers, TIMESTAMP_HEADER),
        header_value(&headers, SIGNATURE_HEADER),
        Utc::now().timestamp(),
        state.signature_max_age_secs,
    ) {
        Ok(verifier) => verifier,
        Err(verification_error) if verification_error.is_configuration_fault() => {
            error!(
                event_name = "ingress.slack.verifier_unavailable",
                correlation_id = %correlation_id,
                error = %verification_error,
                "cannot verify slack request"
            );
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        Err(verification_error) => {
            warn!(
                event_name = "ingress.slack.verification_failed",
                correlation_id = %correlation_id,
                error = %verification_error,
                "dropping slack request"
            );
            return StatusCode::OK;
        }
    };

    // The verifier and the form decoder read the same captured buffer.
    verifier.update(&body);
    let parsed = SlashCommandPayload::from_form(&body);

    if let Err(verification_error) = verifier.ensure() {
        warn!(
            event_name = "ingress.slack.verification_failed",
            correlation_id = %correlation_id,
            error = %verification_error,
            "dropping slack request"
        );
        return StatusCode::OK;
    }

    let payload = match parsed {
        Ok(payload) => payload,
        Err(parse_error) => {
            warn!(
                event_name = "ingress.slack.payload_rejected",
                correlation_id = %correlation_id,
                error = %parse_error,
                "signed request carried an unreadable slash command"
            );
            return StatusCode::OK;
        }
    };

    info!(
        event_name = "ingress.slack.command_received",
        correlation_id = %correlation_id,
        command = %payload.command,
        channel_id = %payload.channel_id,
        user_id = %payload.user_id,
        "received slash command"
    );

    match state.router.route(&payload) {
        CommandOutcome::Reply(message) => {
            deliver(state.sender.as_ref(), &message, &correlation_id, &payload.command).await;
        }
        CommandOutcome::Unknown { command } => {
            info!(
                event_name = "ingress.slack.command_unknown",
                correlation_id = %correlation_id,
                command = %command,
                "command not found"
            );
        }
    }

    StatusCode::OK
}

async fn deliver(
    sender: &dyn MessageSender,
    message: &OutboundMessage,
    correlation_id: &str,
    command: &str,
) {
    let destination_id = message.destination.id();
    let destination_kind = message.destination.kind();

    match sender.send(destination_id, &message.text).await {
        Ok(()) => info!(
            event_name = "egress.slack.message_sent",
            correlation_id,
            command,
            destination_kind,
            destination_id,
            "message successfully sent"
        ),
        Err(delivery_error) => warn!(
            event_name = "egress.slack.message_failed",
            correlation_id,
            command,
            destination_kind,
            destination_id,
            error = %delivery_error,
            "failed to send slack message; not retrying"
        ),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
