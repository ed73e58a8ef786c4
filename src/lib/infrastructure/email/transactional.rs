//! Transactional email API delivery backend
//!
//! Sends one templated message per request to a hosted email API. The API
//! owns the actual email template; this backend only supplies the parameters.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::domain::communication::delivery::{DeliveryBackend, DeliveryError};

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://api.emailjs.com";

/// Transactional API configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct TransactionalConfig {
    /// The account's public key
    #[clap(long = "api-public-key", env = "EMAIL_API_PUBLIC_KEY", default_value = "")]
    pub public_key: String,

    /// The email service identifier
    #[clap(long = "api-service-id", env = "EMAIL_API_SERVICE_ID", default_value = "")]
    pub service_id: String,

    /// The email template identifier
    #[clap(long = "api-template-id", env = "EMAIL_API_TEMPLATE_ID", default_value = "")]
    pub template_id: String,

    /// The API base URL
    #[clap(long = "api-url", env = "EMAIL_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    to_email: &'a str,
    to_name: &'a str,
    subject: &'a str,
    message: &'a str,
    from_name: &'a str,
}

/// Transactional API backend
#[derive(Debug, Clone)]
pub struct TransactionalApi {
    config: TransactionalConfig,
    endpoint: String,
    client: Client,
    initialized: Arc<OnceCell<()>>,
}

impl TransactionalApi {
    /// Create a new transactional API backend
    pub fn new(config: TransactionalConfig) -> Self {
        let base = match config.api_url.trim() {
            "" => DEFAULT_API_URL,
            url => url,
        };
        let endpoint = format!("{}/api/v1.0/email/send", base.trim_end_matches('/'));

        Self {
            config,
            endpoint,
            client: Client::new(),
            initialized: Arc::new(OnceCell::new()),
        }
    }

    /// One-time initialisation; fails while the public key is missing.
    async fn initialize(&self) -> Result<(), DeliveryError> {
        self.initialized
            .get_or_try_init(|| async {
                if self.config.public_key.trim().is_empty() {
                    return Err(DeliveryError::Configuration(
                        "Public key is required".to_string(),
                    ));
                }

                info!(endpoint = %self.endpoint, "transactional email API initialised");

                Ok(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl DeliveryBackend for TransactionalApi {
    async fn send(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> Result<String, DeliveryError> {
        self.initialize().await?;

        let service_id = self.config.service_id.trim();
        let template_id = self.config.template_id.trim();

        if service_id.is_empty() || template_id.is_empty() {
            return Err(DeliveryError::Configuration(
                "Service and template IDs are required".to_string(),
            ));
        }

        let request = SendRequest {
            service_id,
            template_id,
            user_id: self.config.public_key.trim(),
            template_params: TemplateParams {
                to_email: to,
                to_name: name,
                subject,
                message: body,
                from_name,
            },
        };

        debug!(%to, "sending through transactional API");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            return Ok(status.as_u16().to_string());
        }

        let error_body = response.text().await.unwrap_or_default();

        error!(%status, error = %error_body, "transactional API error");

        Err(DeliveryError::Rejected(format!(
            "{status}: {}",
            error_body.trim()
        )))
    }
}
