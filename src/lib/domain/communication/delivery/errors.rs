//! Delivery errors

use std::time::Duration;

use lettre::address::AddressError;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a [`DeliveryBackend`](super::DeliveryBackend) for a single message
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A credential or identifier the backend needs is missing
    #[error("{0}")]
    Configuration(String),

    /// The backend's transport could not be brought up and will not be retried
    #[error("{0}")]
    Unavailable(String),

    /// The recipient or sender address could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The backend answered but refused the message
    #[error("{0}")]
    Rejected(String),

    /// The request never reached the backend, or its answer was lost
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend did not answer in time
    #[error("send timed out after {0:?}")]
    TimedOut(Duration),

    /// Unknown error
    #[error(transparent)]
    UnknownError(anyhow::Error),
}

impl From<anyhow::Error> for DeliveryError {
    fn from(err: anyhow::Error) -> Self {
        DeliveryError::UnknownError(err)
    }
}

impl From<AddressError> for DeliveryError {
    fn from(err: AddressError) -> Self {
        debug!("AddressError -> DeliveryError");

        DeliveryError::InvalidAddress(err.to_string())
    }
}

impl From<lettre::error::Error> for DeliveryError {
    fn from(err: lettre::error::Error) -> Self {
        DeliveryError::UnknownError(err.into())
    }
}

impl From<lettre::transport::smtp::Error> for DeliveryError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        debug!("smtp::Error -> DeliveryError");

        if err.is_permanent() || err.is_transient() {
            DeliveryError::Rejected(err.to_string())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        debug!("reqwest::Error -> DeliveryError");

        if err.is_timeout() {
            DeliveryError::Transport(format!("request timed out: {err}"))
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn test_configuration_error_displays_message_verbatim() {
        let err = DeliveryError::Configuration("SMTP host is required".to_string());

        assert_eq!(err.to_string(), "SMTP host is required");
    }

    #[test]
    fn test_timed_out_display() {
        let err = DeliveryError::TimedOut(Duration::from_secs(30));

        assert_eq!(err.to_string(), "send timed out after 30s");
        assert_eq!(
            DeliveryError::TimedOut(Duration::from_millis(250)).to_string(),
            "send timed out after 250ms"
        );
    }

    #[test]
    fn test_unknown_error_from_anyhow() {
        let err = DeliveryError::from(anyhow!("boom"));

        assert!(matches!(err, DeliveryError::UnknownError(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_address_error_maps_to_invalid_address() {
        let err: DeliveryError = "not an address"
            .parse::<lettre::Address>()
            .unwrap_err()
            .into();

        assert!(matches!(err, DeliveryError::InvalidAddress(_)));
    }
}
