use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

use crate::{
    domain::communication::delivery::DeliveryBackend,
    infrastructure::http::{open_api::ApiDocs, state::AppState},
};

pub mod campaigns;
pub mod recipients;
pub mod stoplight;
pub mod uptime;

pub fn router<B: DeliveryBackend>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(stoplight::handler))
        .route("/openapi.json", get(Json(ApiDocs::openapi())))
        .route("/uptime", get(uptime::handler))
        .route("/recipients", post(recipients::handler))
        .route("/campaigns/send", post(campaigns::send_bulk::handler))
        .route("/campaigns/test", post(campaigns::send_test::handler))
        .route("/campaigns/cancel", post(campaigns::cancel::handler))
        .route("/campaigns/status", get(campaigns::status::handler))
}
