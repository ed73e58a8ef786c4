//! Application state module

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use clap::Parser;
use tokio::sync::RwLock;

use crate::domain::{
    campaigns::{ActivityLog, BulkSender, CancelHandle},
    communication::{delivery::DeliveryBackend, recipients::RecipientRecord},
};

/// Defaults applied to sends started over HTTP
#[derive(Clone, Debug, PartialEq, Eq, Parser)]
pub struct CampaignDefaults {
    /// Pause between recipients when a request does not specify one
    #[arg(long, env = "SEND_DELAY_MS", default_value = "0")]
    pub delay_ms: u64,

    /// Seconds before a single send is abandoned, 0 to wait forever
    #[arg(long, env = "SEND_TIMEOUT_SECS", default_value = "30")]
    pub send_timeout_secs: u64,
}

impl CampaignDefaults {
    /// The per-send timeout, if any
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_secs > 0).then(|| Duration::from_secs(self.send_timeout_secs))
    }
}

impl Default for CampaignDefaults {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            send_timeout_secs: 30,
        }
    }
}

/// Global application state
#[derive(Clone)]
pub struct AppState<B: DeliveryBackend> {
    /// The time the server started
    pub start_time: DateTime<Utc>,

    /// Send defaults
    pub config: CampaignDefaults,

    /// The send orchestrator
    pub sender: Arc<BulkSender<B>>,

    /// Cancels the sender's running session
    pub cancel: CancelHandle,

    /// The currently loaded recipient list
    pub recipients: Arc<RwLock<Vec<RecipientRecord>>>,

    /// User-facing activity log
    pub activity: ActivityLog,
}

impl<B> AppState<B>
where
    B: DeliveryBackend,
{
    /// Create a new application state delivering through `backend`
    pub fn new(config: CampaignDefaults, backend: B) -> Self {
        let activity = ActivityLog::new();
        let cancel = CancelHandle::default();
        let sender = BulkSender::new(Arc::new(backend), Arc::new(activity.clone()))
            .with_cancel_handle(cancel.clone());

        Self {
            start_time: Utc::now(),
            config,
            sender: Arc::new(sender),
            cancel,
            recipients: Arc::default(),
            activity,
        }
    }
}

impl<B> fmt::Debug for AppState<B>
where
    B: DeliveryBackend,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .field("config", &self.config)
            .field("sender", &self.sender)
            .field("recipients", &"RecipientRecord list")
            .finish()
    }
}
