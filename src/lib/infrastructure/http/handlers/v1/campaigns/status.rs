//! Send status handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{campaigns::LogEntry, communication::delivery::DeliveryBackend},
    infrastructure::http::state::AppState,
};

/// Current send state and activity log
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// One of `idle`, `sending`, `cancelled`, `done`
    #[schema(example = "sending")]
    pub phase: String,

    /// Messages accepted by the backend in the current or last session
    #[schema(example = 3)]
    pub sent: usize,

    /// Recipients in the current or last session
    #[schema(example = 10)]
    pub total: usize,

    /// Activity log, oldest first
    pub log: Vec<LogEntry>,
}

/// Get the progress of the current or last send
#[utoipa::path(
    get,
    operation_id = "send_status",
    tag = "Campaigns",
    path = "/api/v1/campaigns/status",
    responses(
        (status = 200, description = "Send status", body = StatusResponse),
    )
)]
pub async fn handler<B: DeliveryBackend>(State(state): State<AppState<B>>) -> Json<StatusResponse> {
    let session = state.sender.state();
    let (sent, total) = session.counts();

    Json(StatusResponse {
        phase: session.phase().to_string(),
        sent,
        total,
        log: state.activity.entries(),
    })
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use testresult::TestResult;

    use super::StatusResponse;
    use crate::{
        domain::{
            campaigns::{MessageTemplate, SendOptions, Severity},
            communication::{delivery::tests::MockDeliveryBackend, recipients::RecipientRecord},
        },
        infrastructure::http::{router, state::tests::test_state},
    };

    #[tokio::test]
    async fn test_status_idle() -> TestResult {
        let response = TestServer::new(router(test_state(None)))?
            .get("/api/v1/campaigns/status")
            .await;

        response.assert_status_ok();

        let json = response.json::<StatusResponse>();

        assert_eq!(json.phase, "idle");
        assert_eq!((json.sent, json.total), (0, 0));
        assert!(json.log.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_status_after_send() -> TestResult {
        let mut backend = MockDeliveryBackend::new();
        backend
            .expect_send()
            .times(1)
            .returning(|_, _, _, _, _| Ok("250".to_string()));

        let state = test_state(Some(backend));

        state
            .sender
            .start(
                &[RecipientRecord::new("ana@example.com", "Ana")],
                &MessageTemplate::new("Hi", "Hello", ""),
                SendOptions::default(),
            )
            .await?;

        let json = TestServer::new(router(state))?
            .get("/api/v1/campaigns/status")
            .await
            .json::<StatusResponse>();

        assert_eq!(json.phase, "done");
        assert_eq!((json.sent, json.total), (1, 1));
        assert_eq!(json.log.len(), 1);
        assert_eq!(json.log[0].severity, Severity::Success);
        assert_eq!(json.log[0].message, "Sent to ana@example.com: 250");

        Ok(())
    }
}
