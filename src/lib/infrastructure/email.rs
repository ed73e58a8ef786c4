//! Delivery backend implementations and their selection.

pub mod smtp;
pub mod transactional;

use async_trait::async_trait;
use clap::{Parser, ValueEnum};

use crate::domain::communication::delivery::{DeliveryBackend, DeliveryError};

use self::{
    smtp::{SmtpRelay, SmtpRelayConfig},
    transactional::{TransactionalApi, TransactionalConfig},
};

/// Which backend delivers messages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// A transactional email HTTP API
    #[default]
    Transactional,

    /// An authenticated SMTP relay
    Smtp,
}

/// Delivery backend configuration
#[derive(Clone, Debug, Default, Parser)]
pub struct BackendConfig {
    /// The backend to use
    #[clap(
        long = "delivery-backend",
        env = "DELIVERY_BACKEND",
        value_enum,
        default_value_t = BackendKind::Transactional
    )]
    pub kind: BackendKind,

    /// Transactional API settings
    #[clap(flatten)]
    pub transactional: TransactionalConfig,

    /// SMTP relay settings
    #[clap(flatten)]
    pub smtp: SmtpRelayConfig,
}

/// The backend chosen at startup
#[derive(Clone, Debug)]
pub enum SelectedBackend {
    /// Transactional API backend
    Transactional(TransactionalApi),

    /// SMTP relay backend
    Smtp(SmtpRelay),
}

impl SelectedBackend {
    /// Build the backend named by `config.kind`
    pub fn from_config(config: &BackendConfig) -> Self {
        match config.kind {
            BackendKind::Transactional => {
                Self::Transactional(TransactionalApi::new(config.transactional.clone()))
            }
            BackendKind::Smtp => Self::Smtp(SmtpRelay::new(config.smtp.clone())),
        }
    }
}

#[async_trait]
impl DeliveryBackend for SelectedBackend {
    async fn send(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> Result<String, DeliveryError> {
        match self {
            Self::Transactional(api) => api.send(to, name, subject, body, from_name).await,
            Self::Smtp(relay) => relay.send(to, name, subject, body, from_name).await,
        }
    }
}
