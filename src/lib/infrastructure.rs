//! Infrastructure layer: concrete delivery backends and the HTTP API.

pub mod email;
pub mod http;
