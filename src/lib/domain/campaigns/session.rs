//! Send session state and options

use std::time::Duration;

use serde::Serialize;

/// Options for one send
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Pause between consecutive recipients
    pub delay: Duration,

    /// Only send to the first recipient
    pub is_test: bool,

    /// Give up on a single backend call after this long
    pub send_timeout: Option<Duration>,
}

impl SendOptions {
    /// Options for a full send with the given delay in milliseconds
    pub fn bulk(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            ..Self::default()
        }
    }

    /// Options for a test send, which reaches at most one recipient
    pub fn test() -> Self {
        Self {
            is_test: true,
            ..Self::default()
        }
    }

    /// Set the per-send timeout
    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = timeout;
        self
    }
}

/// Lifecycle of the sender. `sent` never exceeds `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing has been sent yet
    #[default]
    Idle,

    /// A send is in progress
    Sending {
        /// Messages accepted by the backend so far
        sent: usize,
        /// Recipients in the session
        total: usize,
    },

    /// The send was cancelled before reaching the end of the list
    Cancelled {
        /// Messages accepted by the backend
        sent: usize,
        /// Recipients in the session
        total: usize,
    },

    /// Every recipient was processed
    Done {
        /// Messages accepted by the backend
        sent: usize,
        /// Recipients in the session
        total: usize,
    },
}

impl SessionState {
    /// Whether a send is in progress
    pub fn is_sending(&self) -> bool {
        matches!(self, Self::Sending { .. })
    }

    /// `(sent, total)`, zero when idle
    pub fn counts(&self) -> (usize, usize) {
        match *self {
            Self::Idle => (0, 0),
            Self::Sending { sent, total }
            | Self::Cancelled { sent, total }
            | Self::Done { sent, total } => (sent, total),
        }
    }

    /// Short name of the phase
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Sending { .. } => "sending",
            Self::Cancelled { .. } => "cancelled",
            Self::Done { .. } => "done",
        }
    }
}
