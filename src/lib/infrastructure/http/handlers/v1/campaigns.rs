//! Campaign handlers: start, test, cancel and observe bulk sends.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        campaigns::{MessageTemplate, SendOptions},
        communication::{delivery::DeliveryBackend, recipients::RecipientRecord},
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

pub mod cancel;
pub mod send_bulk;
pub mod send_test;
pub mod status;

/// Message fields shared by bulk and test sends
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SendBody {
    /// Display name of the sender
    #[serde(default)]
    #[schema(example = "Acme")]
    pub from_name: String,

    /// Subject, may contain `{{field}}` tokens
    #[serde(default)]
    #[schema(example = "Hello {{name}}")]
    pub subject: String,

    /// Body, may contain `{{field}}` tokens
    #[serde(default)]
    #[schema(example = "Hi {{name}}, thanks for signing up.")]
    pub message: String,

    /// Pause between recipients in milliseconds, defaults to the server setting
    #[serde(default)]
    #[schema(example = 500)]
    pub delay_ms: Option<u64>,
}

impl SendBody {
    fn template(&self) -> MessageTemplate {
        MessageTemplate::new(&self.subject, &self.message, &self.from_name)
    }
}

/// Returned when a send has been accepted
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendStartedResponse {
    /// The session identifier
    pub session_id: Uuid,

    /// Recipients the session will process
    #[schema(example = 42)]
    pub total: usize,
}

/// Claim the sender and run the session in the background.
fn spawn_session<B: DeliveryBackend>(
    state: &AppState<B>,
    recipients: &[RecipientRecord],
    body: &SendBody,
    options: SendOptions,
) -> Result<SendStartedResponse, ApiError> {
    let options = SendOptions {
        delay: Duration::from_millis(body.delay_ms.unwrap_or(state.config.delay_ms)),
        ..options.with_send_timeout(state.config.send_timeout())
    };

    let session = state.sender.begin(recipients, &body.template(), options)?;

    let response = SendStartedResponse {
        session_id: session.id(),
        total: session.total(),
    };

    let sender = state.sender.clone();
    tokio::spawn(async move {
        sender.run(session).await;
    });

    Ok(response)
}
