//! OpenAPI module

use utoipa::OpenApi;

use crate::{
    domain::{
        campaigns::{LogEntry, Severity},
        communication::recipients::RecipientPreview,
    },
    infrastructure::http::{errors::ErrorResponse, handlers::v1::*},
};

#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Bulk Mailer"),
    paths(
        recipients::handler,
        campaigns::send_bulk::handler,
        campaigns::send_test::handler,
        campaigns::cancel::handler,
        campaigns::status::handler,
        uptime::handler
    ),
    components(schemas(
        RecipientPreview,
        campaigns::SendBody,
        campaigns::SendStartedResponse,
        campaigns::send_test::SendTestBody,
        campaigns::cancel::CancelResponse,
        campaigns::status::StatusResponse,
        LogEntry,
        Severity,
        uptime::UptimeResponse,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
