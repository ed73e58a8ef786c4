//! Send a single test message

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{
        campaigns::SendOptions,
        communication::{delivery::DeliveryBackend, recipients::RecipientRecord},
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::{spawn_session, SendBody, SendStartedResponse};

/// Test send request body
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SendTestBody {
    /// The message
    #[serde(flatten)]
    pub message: SendBody,

    /// Address to send the test to instead of the first loaded recipient
    #[serde(default)]
    #[schema(example = "me@example.com")]
    pub test_email: Option<String>,
}

/// Send the message to one recipient
///
/// Uses `test_email` (named "Test") when given, otherwise the first loaded recipient.
#[utoipa::path(
    post,
    operation_id = "send_test",
    tag = "Campaigns",
    path = "/api/v1/campaigns/test",
    request_body = SendTestBody,
    responses(
        (status = 202, description = "Test send started", body = SendStartedResponse),
        (status = 409, description = "A send is already in progress", body = ErrorResponse),
        (status = 422, description = "Nothing to send", body = ErrorResponse, example = json!({ "error": "Enter a test email or load a CSV" })),
    )
)]
pub async fn handler<B: DeliveryBackend>(
    State(state): State<AppState<B>>,
    request: Result<Json<SendTestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SendStartedResponse>), ApiError> {
    let Json(request) = request?;

    let test_email = request.test_email.as_deref().map(str::trim).unwrap_or_default();

    let recipients: Vec<RecipientRecord> = if test_email.is_empty() {
        state
            .recipients
            .read()
            .await
            .iter()
            .take(1)
            .cloned()
            .collect()
    } else {
        vec![RecipientRecord::new(test_email, "Test")]
    };

    if recipients.is_empty() {
        state.activity.error("Enter a test email or load a CSV");

        return Err(ApiError::new_422("Enter a test email or load a CSV"));
    }

    let response = spawn_session(&state, &recipients, &request.message, SendOptions::test())?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            campaigns::SessionState,
            communication::{delivery::tests::MockDeliveryBackend, recipients::RecipientRecord},
        },
        infrastructure::http::{
            errors::ErrorResponse,
            router,
            state::tests::{load, test_state},
        },
    };

    #[tokio::test]
    async fn test_send_test_to_override_address() -> TestResult {
        let mut backend = MockDeliveryBackend::new();

        backend
            .expect_send()
            .withf(|to, name, subject, _, _| {
                to == "me@example.com" && name == "Test" && subject == "Hi Test"
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok("200".to_string()));

        let state = test_state(Some(backend));
        load(&state, vec![RecipientRecord::new("ana@example.com", "Ana")]).await;

        let response = TestServer::new(router(state.clone()))?
            .post("/api/v1/campaigns/test")
            .json(&json!({
                "subject": "Hi {{name}}",
                "message": "Hello",
                "test_email": " me@example.com ",
            }))
            .await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(
            state.sender.wait_until_finished().await,
            SessionState::Done { sent: 1, total: 1 }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_send_test_uses_first_loaded_recipient() -> TestResult {
        let mut backend = MockDeliveryBackend::new();

        backend
            .expect_send()
            .withf(|to, _, _, _, _| to == "ana@example.com")
            .times(1)
            .returning(|_, _, _, _, _| Ok("200".to_string()));

        let state = test_state(Some(backend));
        let list = (0..50)
            .map(|i| {
                if i == 0 {
                    RecipientRecord::new("ana@example.com", "Ana")
                } else {
                    RecipientRecord::new(&format!("r{i}@example.com"), "R")
                }
            })
            .collect();
        load(&state, list).await;

        let response = TestServer::new(router(state.clone()))?
            .post("/api/v1/campaigns/test")
            .json(&json!({ "subject": "Hi", "message": "Hello" }))
            .await;

        assert_eq!(response.status_code(), StatusCode::ACCEPTED);
        assert_eq!(
            state.sender.wait_until_finished().await,
            SessionState::Done { sent: 1, total: 1 }
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_send_test_without_any_recipient() -> TestResult {
        let state = test_state(None);

        let response = TestServer::new(router(state.clone()))?
            .post("/api/v1/campaigns/test")
            .json(&json!({ "subject": "Hi", "message": "Hello", "test_email": "  " }))
            .await;

        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.json::<ErrorResponse>().error,
            "Enter a test email or load a CSV"
        );
        assert_eq!(
            state.activity.entries().last().map(|e| e.message.clone()),
            Some("Enter a test email or load a CSV".to_string())
        );

        Ok(())
    }
}
