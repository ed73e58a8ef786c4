//! Load recipients handler

use axum::{extract::State, Json};
use tracing::info;

use crate::{
    domain::communication::{
        delivery::DeliveryBackend,
        recipients::{parse_recipients, preview, RecipientPreview},
    },
    infrastructure::http::{errors::ApiError, state::AppState},
};

/// Replace the recipient list with an uploaded CSV file
#[utoipa::path(
    post,
    operation_id = "load_recipients",
    tag = "Recipients",
    path = "/api/v1/recipients",
    request_body(content = String, description = "CSV with a header row", content_type = "text/csv"),
    responses(
        (status = 200, description = "Recipients loaded", body = RecipientPreview),
        (status = 422, description = "The CSV could not be read", body = ErrorResponse, example = json!({ "error": "CSV parse error: CSV has no email column" })),
    )
)]
pub async fn handler<B: DeliveryBackend>(
    State(state): State<AppState<B>>,
    body: String,
) -> Result<Json<RecipientPreview>, ApiError> {
    let records = match parse_recipients(&body) {
        Ok(records) => records,
        Err(err) => {
            state.activity.error(format!("CSV parse error: {err}"));

            return Err(err.into());
        }
    };

    let summary = preview(&records);

    info!(count = summary.count, "recipients loaded");
    state
        .activity
        .info(format!("CSV loaded with {} recipients", summary.count));

    *state.recipients.write().await = records;

    Ok(Json(summary))
}
