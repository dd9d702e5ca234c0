//! Live console for a streamed job.
//!
//! [`StreamingLogConsole`] owns at most one [`JobSession`] at a time. Opening
//! a session spawns a consumption task that pulls chunks from a
//! [`JobSource`], decodes them into lines with a [`LineDecoder`] and appends
//! them to the session. The host reads the session through [`status`],
//! [`lines`] or an event subscription, and ends it with [`close`].
//!
//! # Cancellation
//!
//! Each session gets its own [`CancellationToken`]. The consumption task
//! races every pull against it, and appends re-check it under the session
//! lock. `close` fires the token under that same lock, so once it returns no
//! further line can land in the session.
//!
//! # Failures
//!
//! Transport failures never reach the host as errors. They end the session
//! as `Errored` with one synthetic `❌ Error: ...` line appended after
//! whatever was already received. Cancellation ends it as `Cancelled` with
//! no extra line.
//!
//! [`status`]: StreamingLogConsole::status
//! [`lines`]: StreamingLogConsole::lines
//! [`close`]: StreamingLogConsole::close

use crate::api::JobSource;
use crate::decoder::LineDecoder;
use crate::error::ConsoleError;
use crate::models::{JobSession, JobStatus, LogLine};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Change notifications for the host view, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Opened { job_id: String, label: String },
    /// A line was appended; the view should scroll to the bottom.
    Line(LogLine),
    StatusChanged(JobStatus),
}

type Subscriber = mpsc::UnboundedSender<ConsoleEvent>;

#[derive(Debug)]
struct Shared {
    session: JobSession,
    events: Option<Subscriber>,
}

impl Shared {
    fn emit(&self, event: ConsoleEvent) {
        if let Some(tx) = &self.events {
            // A host that stopped listening is not our problem.
            let _ = tx.send(event);
        }
    }

    fn append(&mut self, text: String) {
        if let Some(line) = self.session.push_line(text) {
            self.emit(ConsoleEvent::Line(line));
        }
    }

    fn set_status(&mut self, status: JobStatus) {
        self.session.status = status;
        self.emit(ConsoleEvent::StatusChanged(status));
    }
}

type SharedState = Arc<Mutex<Shared>>;

fn lock(state: &SharedState) -> MutexGuard<'_, Shared> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ActiveSession {
    state: SharedState,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Streams one job's output into an append-only line list.
#[derive(Debug)]
pub struct StreamingLogConsole<S> {
    source: Arc<S>,
    active: Option<ActiveSession>,
    subscriber: Option<Subscriber>,
}

impl<S: JobSource> StreamingLogConsole<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            active: None,
            subscriber: None,
        }
    }

    /// Receive [`ConsoleEvent`]s for this and all later sessions.
    ///
    /// Replaces any earlier subscription.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ConsoleEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(active) = &self.active {
            lock(&active.state).events = Some(tx.clone());
        }
        self.subscriber = Some(tx);
        rx
    }

    /// Start a new session for `job_id` and begin streaming immediately.
    ///
    /// A session that is still open is closed first, so two consumption
    /// loops never feed the same console.
    ///
    /// # Arguments
    ///
    /// * `job_id` - Source to scrape; must not be empty or whitespace
    /// * `label` - Display name carried on the session
    /// * `token` - Bearer token for the trigger request; not retained
    ///
    /// # Returns
    ///
    /// `Ok(())` once the session is `Running`. Connection and stream failures
    /// arrive later as an `Errored` status, not here. The only error is
    /// [`ConsoleError::InvalidJobId`], in which case nothing is started.
    #[instrument(level = "info", skip(self, token))]
    pub async fn open(&mut self, job_id: &str, label: &str, token: &str) -> Result<(), ConsoleError> {
        if job_id.trim().is_empty() {
            return Err(ConsoleError::InvalidJobId);
        }
        if self.active.is_some() {
            debug!("Closing previous session before opening a new one");
            self.close().await;
        }

        let state = Arc::new(Mutex::new(Shared {
            session: JobSession::start(job_id, label),
            events: self.subscriber.clone(),
        }));
        {
            let shared = lock(&state);
            shared.emit(ConsoleEvent::Opened {
                job_id: job_id.to_string(),
                label: label.to_string(),
            });
            shared.emit(ConsoleEvent::StatusChanged(JobStatus::Running));
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_session(
            Arc::clone(&self.source),
            job_id.to_string(),
            token.to_string(),
            Arc::clone(&state),
            cancel.clone(),
        ));

        info!("Job session opened");
        self.active = Some(ActiveSession {
            state,
            cancel,
            task,
        });
        Ok(())
    }

    /// End the current session and hand it back.
    ///
    /// A running session is cancelled and reported as `Cancelled`; a session
    /// that already ended is returned as it was. Returns `None` when there
    /// is nothing open, so repeated calls are harmless.
    ///
    /// # Returns
    ///
    /// The discarded session with every line it received. Afterwards the
    /// console reports `Idle` and no lines.
    pub async fn close(&mut self) -> Option<JobSession> {
        let active = self.active.take()?;
        {
            let mut shared = lock(&active.state);
            active.cancel.cancel();
            if shared.session.status == JobStatus::Running {
                shared.set_status(JobStatus::Cancelled);
                info!(
                    job_id = %shared.session.job_id,
                    lines = shared.session.lines.len(),
                    "Job session cancelled"
                );
            }
        }

        if let Err(e) = active.task.await {
            warn!(error = %e, "Consumption task did not exit cleanly");
        }

        let session = lock(&active.state).session.clone();
        Some(session)
    }

    /// `Idle` when no session is open.
    pub fn status(&self) -> JobStatus {
        self.active
            .as_ref()
            .map(|active| lock(&active.state).session.status)
            .unwrap_or(JobStatus::Idle)
    }

    /// Snapshot of the current session's lines in sequence order.
    pub fn lines(&self) -> Vec<LogLine> {
        self.active
            .as_ref()
            .map(|active| lock(&active.state).session.lines.clone())
            .unwrap_or_default()
    }

    /// The view follows the tail on every append.
    pub fn auto_scroll(&self) -> bool {
        true
    }
}

impl<S> Drop for StreamingLogConsole<S> {
    fn drop(&mut self) {
        if let Some(active) = &self.active {
            active.cancel.cancel();
        }
    }
}

#[instrument(level = "info", skip(source, token, state, cancel))]
async fn run_session<S: JobSource>(
    source: Arc<S>,
    job_id: String,
    token: String,
    state: SharedState,
    cancel: CancellationToken,
) {
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConsoleError::Cancelled),
        result = consume(source.as_ref(), &job_id, &token, &state, &cancel) => result,
    };
    settle(&state, &cancel, outcome);
}

async fn consume<S: JobSource>(
    source: &S,
    job_id: &str,
    token: &str,
    state: &SharedState,
    cancel: &CancellationToken,
) -> Result<(), ConsoleError> {
    let mut stream = source.start(job_id, token).await?;
    let mut decoder = LineDecoder::new();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => append_lines(state, cancel, decoder.push_chunk(&chunk))?,
            Err(err) => {
                // Text received before the break is kept, unterminated tail included.
                if !err.is_cancelled() {
                    append_lines(state, cancel, decoder.finish())?;
                }
                return Err(err);
            }
        }
    }
    append_lines(state, cancel, decoder.finish())
}

fn append_lines(
    state: &SharedState,
    cancel: &CancellationToken,
    lines: Vec<String>,
) -> Result<(), ConsoleError> {
    let mut shared = lock(state);
    if cancel.is_cancelled() {
        return Err(ConsoleError::Cancelled);
    }
    for text in lines {
        shared.append(text);
    }
    Ok(())
}

fn settle(state: &SharedState, cancel: &CancellationToken, outcome: Result<(), ConsoleError>) {
    let mut shared = lock(state);
    // `close` already recorded the cancellation.
    if shared.session.status != JobStatus::Running {
        return;
    }

    let status = match outcome {
        Ok(()) => JobStatus::Finished,
        Err(err) if err.is_cancelled() || cancel.is_cancelled() => JobStatus::Cancelled,
        Err(err) => {
            warn!(error = %err, "Job stream failed");
            shared.append(format!("❌ Error: {err}"));
            JobStatus::Errored
        }
    };
    shared.set_status(status);
    info!(?status, lines = shared.session.lines.len(), "Job session ended");
}
