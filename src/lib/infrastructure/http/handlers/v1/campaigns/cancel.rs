//! Cancel the running send

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::communication::delivery::DeliveryBackend,
    infrastructure::http::state::AppState,
};

/// Cancel response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    /// Whether a send was running when cancellation was requested
    pub was_sending: bool,
}

/// Stop the running send before its next recipient
#[utoipa::path(
    post,
    operation_id = "cancel_send",
    tag = "Campaigns",
    path = "/api/v1/campaigns/cancel",
    responses(
        (status = 202, description = "Cancellation requested", body = CancelResponse),
    )
)]
pub async fn handler<B: DeliveryBackend>(
    State(state): State<AppState<B>>,
) -> (StatusCode, Json<CancelResponse>) {
    let was_sending = state.sender.state().is_sending();

    state.cancel.cancel();

    (StatusCode::ACCEPTED, Json(CancelResponse { was_sending }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use testresult::TestResult;

    use super::CancelResponse;
    use crate::{
        domain::{
            campaigns::{MessageTemplate, SendOptions, SessionState},
            communication::{delivery::tests::MockDeliveryBackend, recipients::RecipientRecord},
        },
        infrastructure::http::{router, state::tests::test_state},
    };

    #[tokio::test]
    async fn test_cancel_stops_session_before_next_recipient() -> TestResult {
        let mut backend = MockDeliveryBackend::new();
        backend.expect_send().times(0);

        let state = test_state(Some(backend));
        let recipients = vec![
            RecipientRecord::new("ana@example.com", "Ana"),
            RecipientRecord::new("bo@example.com", "Bo"),
        ];

        let session = state.sender.begin(
            &recipients,
            &MessageTemplate::new("Hi", "Hello", ""),
            SendOptions::default(),
        )?;

        let response = TestServer::new(router(state.clone()))?
            .post("/api/v1/campaigns/cancel")
            .await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert!(response.json::<CancelResponse>().was_sending);

        assert_eq!(
            state.sender.run(session).await,
            SessionState::Cancelled { sent: 0, total: 2 }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_when_idle() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .post("/api/v1/campaigns/cancel")
            .await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert!(!response.json::<CancelResponse>().was_sending);

        Ok(())
    }
}
