//! Bulk send campaigns: template rendering and the send orchestrator.

mod errors;
mod events;
mod sender;
mod session;
mod template;

pub use errors::{StartError, ValidationError};
pub use events::{ActivityLog, EventSink, LogEntry, Progress, SendEvent, SendOutcome, Severity};
pub use sender::{BulkSender, CancelHandle, SendSession};
pub use session::{SendOptions, SessionState};
pub use template::{render, MessageTemplate};
