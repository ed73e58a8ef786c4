//! Start a bulk send

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    domain::{campaigns::SendOptions, communication::delivery::DeliveryBackend},
    infrastructure::http::{errors::ApiError, state::AppState},
};

use super::{spawn_session, SendBody, SendStartedResponse};

/// Send the message to every loaded recipient
#[utoipa::path(
    post,
    operation_id = "send_bulk",
    tag = "Campaigns",
    path = "/api/v1/campaigns/send",
    request_body = SendBody,
    responses(
        (status = 202, description = "Send started", body = SendStartedResponse),
        (status = 409, description = "A send is already in progress", body = ErrorResponse),
        (status = 422, description = "Nothing to send", body = ErrorResponse, example = json!({ "error": "Load a CSV first" })),
    )
)]
pub async fn handler<B: DeliveryBackend>(
    State(state): State<AppState<B>>,
    request: Result<Json<SendBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SendStartedResponse>), ApiError> {
    let Json(request) = request?;
    let recipients = state.recipients.read().await.clone();

    if recipients.is_empty() {
        state.activity.error("Load a CSV first");

        return Err(ApiError::new_422("Load a CSV first"));
    }

    let response = spawn_session(&state, &recipients, &request, SendOptions::default())?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}
