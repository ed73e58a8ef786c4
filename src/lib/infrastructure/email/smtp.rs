//! SMTP relay delivery backend

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use clap::Parser;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::communication::delivery::{DeliveryBackend, DeliveryError};

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// SMTP relay configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SmtpRelayConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST", default_value = "")]
    pub host: String,

    /// The SMTP port, defaults to the standard port for the chosen security mode
    #[clap(id = "smtp_port", long = "smtp-port", env = "SMTP_PORT")]
    pub port: Option<u16>,

    /// Use implicit TLS instead of STARTTLS
    #[clap(long = "smtp-secure", env = "SMTP_SECURE")]
    pub secure: bool,

    /// The SMTP username, also used as the sender address
    #[clap(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    pub username: String,

    /// The SMTP app password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", default_value = "")]
    pub password: String,
}

/// Delivers through an authenticated SMTP relay.
///
/// The connection to the relay is established and verified on the first send.
/// The outcome is kept for the lifetime of the backend (and its clones): a relay
/// that failed to come up is reported as unavailable on every later send
/// without another attempt.
#[derive(Clone)]
pub struct SmtpRelay {
    config: SmtpRelayConfig,
    transport: Arc<OnceCell<Result<Transport, String>>>,
}

impl SmtpRelay {
    /// Create a new SMTP relay backend
    pub fn new(config: SmtpRelayConfig) -> Self {
        Self {
            config,
            transport: Arc::new(OnceCell::new()),
        }
    }

    fn check_credentials(&self) -> Result<(), DeliveryError> {
        let missing = [&self.config.host, &self.config.username, &self.config.password]
            .iter()
            .any(|value| value.trim().is_empty());

        if missing {
            return Err(DeliveryError::Configuration(
                "SMTP host, username, and app password are required".to_string(),
            ));
        }

        Ok(())
    }

    fn build_transport(&self) -> Result<Transport, lettre::transport::smtp::Error> {
        let host = self.config.host.trim();

        let relay = if self.config.secure {
            Transport::relay(host)?
        } else {
            Transport::starttls_relay(host)?
        };

        let relay = relay.credentials(Credentials::new(
            self.config.username.trim().to_string(),
            self.config.password.trim().to_string(),
        ));

        Ok(match self.config.port {
            Some(port) => relay.port(port).build(),
            None => relay.build(),
        })
    }

    async fn connect(&self) -> Result<Transport, String> {
        info!(host = %self.config.host, "connecting to SMTP relay");

        let transport = self
            .build_transport()
            .map_err(|e| format!("SMTP relay could not be configured: {e}"))?;

        match transport.test_connection().await {
            Ok(true) => Ok(transport),
            Ok(false) => Err("SMTP relay refused the connection".to_string()),
            Err(e) => {
                warn!(error = %e, "SMTP relay unavailable");

                Err(format!("SMTP relay failed to load: {e}"))
            }
        }
    }

    async fn transport(&self) -> Result<&Transport, DeliveryError> {
        self.transport
            .get_or_init(|| self.connect())
            .await
            .as_ref()
            .map_err(|e| DeliveryError::Unavailable(e.clone()))
    }

    /// The `From` mailbox: `from_name`, or the username when blank, at the username's address.
    pub fn sender_mailbox(&self, from_name: &str) -> Result<Mailbox, DeliveryError> {
        let username = self.config.username.trim();
        let from_name = from_name.trim();
        let display = if from_name.is_empty() {
            username
        } else {
            from_name
        };

        Ok(Mailbox::new(
            Some(display.to_string()),
            username.parse::<Address>()?,
        ))
    }
}

impl fmt::Debug for SmtpRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpRelay")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("secure", &self.config.secure)
            .field("username", &self.config.username)
            .field("loaded", &self.transport.get().map(Result::is_ok))
            .finish()
    }
}

#[async_trait]
impl DeliveryBackend for SmtpRelay {
    async fn send(
        &self,
        to: &str,
        _name: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> Result<String, DeliveryError> {
        self.check_credentials()?;

        let transport = self.transport().await?;

        let email = Message::builder()
            .from(self.sender_mailbox(from_name)?)
            .to(Mailbox::new(None, to.parse::<Address>()?))
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        debug!(%to, "sending through SMTP relay");

        let response = transport.send(email).await?;

        Ok(response.code().to_string())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn config(host: &str, port: Option<u16>) -> SmtpRelayConfig {
        SmtpRelayConfig {
            host: host.to_string(),
            port,
            secure: false,
            username: "sender@example.com".to_string(),
            password: "app-password".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_connecting() {
        let relay = SmtpRelay::new(SmtpRelayConfig {
            host: "smtp.example.com".to_string(),
            ..SmtpRelayConfig::default()
        });

        let result = relay
            .send("ana@example.com", "Ana", "Hi", "Body", "Acme")
            .await;

        assert!(matches!(result, Err(DeliveryError::Configuration(_))));
        assert!(relay.transport.get().is_none());
    }

    #[test]
    fn test_sender_mailbox_uses_from_name() -> TestResult {
        let relay = SmtpRelay::new(config("smtp.example.com", None));

        let mailbox = relay.sender_mailbox("Acme")?;

        assert_eq!(mailbox.to_string(), "Acme <sender@example.com>");

        Ok(())
    }

    #[test]
    fn test_sender_mailbox_falls_back_to_username() -> TestResult {
        let relay = SmtpRelay::new(config("smtp.example.com", None));

        let mailbox = relay.sender_mailbox("  ")?;

        assert_eq!(mailbox.name.as_deref(), Some("sender@example.com"));
        assert_eq!(mailbox.email.to_string(), "sender@example.com");

        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_not_retried() {
        let relay = SmtpRelay::new(config("127.0.0.1", Some(1)));

        let first = relay
            .send("ana@example.com", "Ana", "Hi", "Body", "Acme")
            .await;

        assert!(matches!(first, Err(DeliveryError::Unavailable(_))));

        let cached = relay.transport.get().map(|result| result.is_err());
        assert_eq!(cached, Some(true));

        let clone = relay.clone();
        let second = clone
            .send("bo@example.com", "Bo", "Hi", "Body", "Acme")
            .await;

        match (first, second) {
            (Err(DeliveryError::Unavailable(a)), Err(DeliveryError::Unavailable(b))) => {
                assert_eq!(a, b)
            }
            other => panic!("expected two unavailable errors, got {other:?}"),
        }
    }
}
