//! Delivery backend module

mod errors;

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

pub use errors::DeliveryError;

/// A backend capable of transmitting a single message.
///
/// Implementations own their transport, credentials and any one-time
/// initialisation. Exactly one backend is active for a [`BulkSender`], chosen
/// when the sender is constructed.
///
/// [`BulkSender`]: crate::domain::campaigns::BulkSender
#[async_trait]
pub trait DeliveryBackend: Clone + Send + Sync + 'static {
    /// Send one message.
    ///
    /// # Arguments
    /// * `to` - The recipient's email address, already trimmed.
    /// * `name` - The recipient's display name, possibly empty.
    /// * `subject` - The rendered subject.
    /// * `body` - The rendered body.
    /// * `from_name` - The sender's display name, possibly empty.
    ///
    /// # Returns
    /// An opaque response token reported by the backend, or a [`DeliveryError`].
    async fn send(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        body: &str,
        from_name: &str,
    ) -> Result<String, DeliveryError>;
}

#[cfg(test)]
mock! {
    pub DeliveryBackend {}

    impl Clone for DeliveryBackend {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl DeliveryBackend for DeliveryBackend {
        async fn send(&self, to: &str, name: &str, subject: &str, body: &str, from_name: &str) -> Result<String, DeliveryError>;
    }
}

#[cfg(test)]
pub mod tests {
    pub use super::MockDeliveryBackend;
}
