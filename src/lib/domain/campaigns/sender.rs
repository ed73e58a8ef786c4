//! Bulk send orchestrator

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::watch, time};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::communication::{
    delivery::{DeliveryBackend, DeliveryError},
    recipients::RecipientRecord,
};

use super::{
    errors::{StartError, ValidationError},
    events::{EventSink, LogEntry, Progress, SendEvent, SendOutcome, Severity},
    session::{SendOptions, SessionState},
    template::{render, MessageTemplate},
};

/// Requests cancellation of the running send.
///
/// Cancellation is observed between recipients only; a message already handed
/// to the backend is never interrupted.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Ask the running send to stop before its next recipient
    pub fn cancel(&self) {
        debug!("cancellation requested");

        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A validated send that has claimed the sender and is ready to run.
#[derive(Debug)]
pub struct SendSession {
    id: Uuid,
    recipients: Vec<RecipientRecord>,
    template: MessageTemplate,
    options: SendOptions,
}

impl SendSession {
    /// The session's identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of recipients the session will process
    pub fn total(&self) -> usize {
        self.recipients.len()
    }
}

/// Sends one templated message per recipient through a [`DeliveryBackend`],
/// strictly one at a time.
///
/// At most one session runs at a time; [`BulkSender::begin`] refuses to start
/// another while the state is [`SessionState::Sending`].
pub struct BulkSender<B>
where
    B: DeliveryBackend,
{
    backend: Arc<B>,
    events: Arc<dyn EventSink>,
    cancel: CancelHandle,
    state: watch::Sender<SessionState>,
}

impl<B> BulkSender<B>
where
    B: DeliveryBackend,
{
    /// Creates a new sender delivering through `backend` and reporting to `events`.
    pub fn new(backend: Arc<B>, events: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            events,
            cancel: CancelHandle::default(),
            state: watch::Sender::new(SessionState::Idle),
        }
    }

    /// Use an existing cancel handle instead of a fresh one.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// The current state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until no session is running and return the resulting state.
    pub async fn wait_until_finished(&self) -> SessionState {
        let mut rx = self.subscribe();

        let state = match rx.wait_for(|state| !state.is_sending()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };

        state
    }

    /// Validates a send and claims the sender for it.
    ///
    /// The template is trimmed and copied so later edits do not affect the
    /// session. A test send keeps only the first recipient.
    ///
    /// # Returns
    /// - [`Ok`] with a [`SendSession`] to pass to [`BulkSender::run`]; the state
    ///   is already [`SessionState::Sending`].
    /// - [`Err`] with a [`StartError`] if the request is invalid or another
    ///   session is running. Nothing is sent.
    pub fn begin(
        &self,
        recipients: &[RecipientRecord],
        template: &MessageTemplate,
        options: SendOptions,
    ) -> Result<SendSession, StartError> {
        let template = template.snapshot();

        if template.subject.is_empty() || template.body.is_empty() {
            return Err(self.reject(ValidationError::MissingContent));
        }

        let recipients = if options.is_test {
            recipients.iter().take(1).cloned().collect::<Vec<_>>()
        } else {
            recipients.to_vec()
        };

        if recipients.is_empty() {
            return Err(self.reject(ValidationError::NoRecipients));
        }

        let total = recipients.len();

        let claimed = self.state.send_if_modified(|state| {
            if state.is_sending() {
                return false;
            }

            *state = SessionState::Sending { sent: 0, total };
            true
        });

        if !claimed {
            warn!("send rejected, another send is in progress");

            return Err(StartError::AlreadySending);
        }

        self.cancel.reset();

        Ok(SendSession {
            id: Uuid::now_v7(),
            recipients,
            template,
            options,
        })
    }

    /// Runs a session to completion or cancellation and returns its terminal state.
    ///
    /// If the session is dropped or panics before finishing, the sender is
    /// released as [`SessionState::Cancelled`] so later sessions can start.
    pub async fn run(&self, session: SendSession) -> SessionState {
        let span = info_span!("bulk_send", session_id = %session.id, total = session.total());
        let _release = ReleaseOnDrop(self);

        self.drive(session).instrument(span).await
    }

    /// Validates and runs a send, see [`BulkSender::begin`] and [`BulkSender::run`].
    pub async fn start(
        &self,
        recipients: &[RecipientRecord],
        template: &MessageTemplate,
        options: SendOptions,
    ) -> Result<SessionState, StartError> {
        let session = self.begin(recipients, template, options)?;

        Ok(self.run(session).await)
    }

    async fn drive(&self, session: SendSession) -> SessionState {
        let SendSession {
            recipients,
            template,
            options,
            ..
        } = session;

        let total = recipients.len();
        let mut sent = 0;

        info!(is_test = options.is_test, "send started");

        self.emit(SendEvent::Progress(Progress::sending(sent, total)));

        for recipient in recipients {
            if self.cancel.is_cancelled() {
                return self.finish_cancelled(sent, total);
            }

            let to = recipient.email().trim().to_string();

            if to.is_empty() {
                debug!("skipping recipient without email");

                self.log(Severity::Error, "Skipping row with empty email");
                self.emit(SendEvent::Outcome(SendOutcome::Skipped {
                    recipient,
                    reason: "empty email".to_string(),
                }));
                continue;
            }

            let subject = render(&template.subject, &recipient);
            let body = render(&template.body, &recipient);

            let result = self
                .deliver(
                    &to,
                    recipient.name().trim(),
                    &subject,
                    &body,
                    &template.from_name,
                    options.send_timeout,
                )
                .await;

            match result {
                Ok(response) => {
                    sent += 1;
                    debug!(%to, %response, "message sent");

                    self.state.send_replace(SessionState::Sending { sent, total });
                    self.log(Severity::Success, format!("Sent to {to}: {response}"));
                    self.emit(SendEvent::Outcome(SendOutcome::Sent {
                        recipient,
                        response,
                    }));
                    self.emit(SendEvent::Progress(Progress::sending(sent, total)));
                }
                Err(err) => {
                    warn!(%to, error = %err, "message failed");

                    self.log(Severity::Error, format!("Failed to {to}: {err}"));
                    self.emit(SendEvent::Outcome(SendOutcome::Failed {
                        recipient,
                        error: err.to_string(),
                    }));
                }
            }

            if !self.cancel.is_cancelled() && !options.delay.is_zero() {
                time::sleep(options.delay).await;
            }
        }

        // Cancellation requested during the final send still ends as cancelled.
        if self.cancel.is_cancelled() {
            return self.finish_cancelled(sent, total);
        }

        info!(sent, total, "send finished");

        let state = SessionState::Done { sent, total };
        self.state.send_replace(state);
        self.emit(SendEvent::Progress(Progress::done(sent, total)));

        state
    }

    async fn deliver(
        &self,
        to: &str,
        name: &str,
        subject: &str,
        body: &str,
        from_name: &str,
        timeout: Option<Duration>,
    ) -> Result<String, DeliveryError> {
        let send = self.backend.send(to, name, subject, body, from_name);

        match timeout {
            Some(limit) => time::timeout(limit, send)
                .await
                .map_err(|_| DeliveryError::TimedOut(limit))?,
            None => send.await,
        }
    }

    fn finish_cancelled(&self, sent: usize, total: usize) -> SessionState {
        info!(sent, total, "send cancelled");

        let state = SessionState::Cancelled { sent, total };
        self.state.send_replace(state);
        self.emit(SendEvent::Progress(Progress::cancelled(sent, total)));
        self.log(Severity::Error, "Sending cancelled");

        state
    }

    fn abandon(&self) {
        let mut abandoned = None;

        self.state.send_if_modified(|state| match *state {
            SessionState::Sending { sent, total } => {
                *state = SessionState::Cancelled { sent, total };
                abandoned = Some((sent, total));
                true
            }
            _ => false,
        });

        if let Some((sent, total)) = abandoned {
            error!(sent, total, "send stopped before finishing");

            self.emit(SendEvent::Progress(Progress::cancelled(sent, total)));
            self.log(Severity::Error, "Sending stopped unexpectedly");
        }
    }

    fn reject(&self, err: ValidationError) -> StartError {
        warn!(error = %err, "send rejected");

        self.log(Severity::Error, err.to_string());

        err.into()
    }

    fn log(&self, severity: Severity, message: impl Into<String>) {
        self.emit(SendEvent::Log(LogEntry::now(message, severity)));
    }

    fn emit(&self, event: SendEvent) {
        self.events.emit(event);
    }
}

struct ReleaseOnDrop<'a, B: DeliveryBackend>(&'a BulkSender<B>);

impl<B: DeliveryBackend> Drop for ReleaseOnDrop<'_, B> {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

impl<B> fmt::Debug for BulkSender<B>
where
    B: DeliveryBackend,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkSender")
            .field("backend", &"DeliveryBackend")
            .field("cancel", &self.cancel)
            .field("state", &self.state())
            .finish()
    }
}
