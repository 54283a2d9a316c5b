//! Build launcher: submits a build and follows it through the Jenkins queue
//! until the job's last build reports a result.
//!
//! A session runs as its own task and reports progress as [`StatusEvent`]s on a
//! channel. The stream ends with exactly one `Done` or `Failed`, or ends
//! silently when the session's cancellation token fires.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{LaunchError, Result};
use crate::jenkins::links::console_url;
use crate::jenkins::{BuildParameters, JenkinsApi, JobRef};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Progress reported by a launch session.
#[derive(Debug)]
pub enum StatusEvent {
    /// The build request was accepted and queued at `queue_url`.
    Submitted { queue_url: String },
    /// The queue item has no executable yet.
    InQueue { why: Option<String> },
    /// An executable exists and the last build is still running.
    Building { number: u64 },
    /// The last build finished. Terminal.
    Done(BuildOutcome),
    /// Submission or polling failed. Terminal.
    Failed(LaunchError),
}

impl StatusEvent {
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/// A finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub job: String,
    pub number: u64,
    /// Jenkins result code, e.g. "SUCCESS", "FAILURE", "ABORTED"
    pub result: String,
    pub url: String,
    pub console_url: String,
    pub completed_at: DateTime<Utc>,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        self.result == "SUCCESS"
    }
}

/// How a session ended.
#[derive(Debug)]
pub enum LaunchOutcome {
    Finished(BuildOutcome),
    Failed(LaunchError),
    Cancelled,
}

/// Starts launch sessions and enforces one outstanding session per job.
pub struct Launcher<C> {
    client: Arc<C>,
    poll_interval: Duration,
    active: Arc<Mutex<HashSet<String>>>,
}

impl<C: JenkinsApi + 'static> Launcher<C> {
    #[cfg(test)]
    pub fn new(client: Arc<C>) -> Self {
        Self::with_poll_interval(client, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(client: Arc<C>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Whether a session for `job` is still outstanding.
    #[cfg(test)]
    pub fn is_running(&self, job: &JobRef) -> bool {
        lock(&self.active).contains(&job.url)
    }

    /// Starts a launch session for `job`.
    ///
    /// Submission and polling happen on a spawned task; this returns as soon
    /// as the session is registered.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::AlreadyRunning`] while another session for the
    /// same job URL has not reached its terminal event.
    pub fn launch(
        &self,
        job: JobRef,
        params: BuildParameters,
        cancel: CancellationToken,
    ) -> std::result::Result<LaunchSession, LaunchError> {
        let guard = ActiveLaunch::acquire(&self.active, &job)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        info!("Launching job: {}", job.name);

        let session = Session {
            guard: Some(guard),
            client: Arc::clone(&self.client),
            job,
            params,
            poll_interval: self.poll_interval,
            cancel,
            events: events_tx,
        };

        let handle = tokio::spawn(session.run());

        Ok(LaunchSession {
            events: events_rx,
            handle,
        })
    }
}

/// Handle to a running session.
pub struct LaunchSession {
    events: mpsc::UnboundedReceiver<StatusEvent>,
    handle: JoinHandle<()>,
}

impl LaunchSession {
    /// Next event, or `None` once the session has ended.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        self.events.recv().await
    }

    /// Drains the remaining events and waits for the session task to exit.
    pub async fn finish(self) -> LaunchOutcome {
        self.follow(|_| {}).await
    }

    /// Like [`finish`](Self::finish), handing every event to `on_event` first.
    pub async fn follow(mut self, mut on_event: impl FnMut(&StatusEvent)) -> LaunchOutcome {
        let mut outcome = LaunchOutcome::Cancelled;

        while let Some(event) = self.events.recv().await {
            on_event(&event);
            match event {
                StatusEvent::Done(build) => outcome = LaunchOutcome::Finished(build),
                StatusEvent::Failed(error) => outcome = LaunchOutcome::Failed(error),
                _ => {}
            }
        }

        if let Err(e) = self.handle.await {
            warn!("Launch task ended abnormally: {e}");
        }

        outcome
    }
}

/// Registry entry for an outstanding session, released on drop.
struct ActiveLaunch {
    key: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl ActiveLaunch {
    fn acquire(
        active: &Arc<Mutex<HashSet<String>>>,
        job: &JobRef,
    ) -> std::result::Result<Self, LaunchError> {
        if !lock(active).insert(job.url.clone()) {
            return Err(LaunchError::AlreadyRunning {
                job: job.name.clone(),
            });
        }

        Ok(Self {
            key: job.url.clone(),
            active: Arc::clone(active),
        })
    }
}

impl Drop for ActiveLaunch {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.key);
    }
}

fn lock(active: &Mutex<HashSet<String>>) -> std::sync::MutexGuard<'_, HashSet<String>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Result of one polling tick.
enum PollStep {
    Queued { why: Option<String> },
    Building { number: u64 },
    Finished(BuildOutcome),
}

struct Session<C> {
    // Declared first so it is released before the event channel closes.
    guard: Option<ActiveLaunch>,
    client: Arc<C>,
    job: JobRef,
    params: BuildParameters,
    poll_interval: Duration,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<StatusEvent>,
}

impl<C: JenkinsApi> Session<C> {
    fn emit(&self, event: StatusEvent) {
        if self.events.send(event).is_err() {
            debug!("Status receiver for '{}' dropped", self.job.name);
        }
    }

    /// Frees the job for another launch, then sends the terminal event.
    fn terminate(&mut self, event: StatusEvent) {
        self.guard = None;
        self.emit(event);
    }

    fn abandon(&mut self) {
        self.guard = None;
        info!("Launch of '{}' cancelled", self.job.name);
    }

    async fn run(mut self) {
        let submitted = tokio::select! {
            biased;
            () = self.cancel.cancelled() => None,
            submitted = self.client.submit_build(&self.job, &self.params) => Some(submitted),
        };

        let Some(submitted) = submitted else {
            self.abandon();
            return;
        };

        let queue_url = match submitted {
            Ok(queue_url) => queue_url,
            Err(e) => {
                warn!("Submission for '{}' failed: {e}", self.job.name);
                self.terminate(StatusEvent::Failed(LaunchError::Submission(e)));
                return;
            }
        };

        info!("Job '{}' queued at {queue_url}", self.job.name);
        self.emit(StatusEvent::Submitted {
            queue_url: queue_url.clone(),
        });

        // First check one interval after submission, like a plain ticker.
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            debug!("Checking status of '{}'", self.job.name);

            let step = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                step = self.poll_once(&queue_url) => step,
            };

            match step {
                Ok(PollStep::Queued { why }) => self.emit(StatusEvent::InQueue { why }),
                Ok(PollStep::Building { number }) => {
                    self.emit(StatusEvent::Building { number });
                }
                Ok(PollStep::Finished(outcome)) => {
                    info!(
                        "Build #{} of '{}' finished with {}",
                        outcome.number, self.job.name, outcome.result
                    );
                    self.terminate(StatusEvent::Done(outcome));
                    return;
                }
                Err(e) => {
                    warn!("Polling '{}' failed: {e}", self.job.name);
                    self.terminate(StatusEvent::Failed(LaunchError::Poll(e)));
                    return;
                }
            }
        }

        self.abandon();
    }

    async fn poll_once(&self, queue_url: &str) -> Result<PollStep> {
        let item = self.client.queue_item(queue_url).await?;

        let Some(executable) = item.executable else {
            return Ok(PollStep::Queued { why: item.why });
        };
        debug!(
            "'{}' left the queue as build #{} ({})",
            self.job.name, executable.number, executable.url
        );

        // The executable only says the build started; the last build says
        // whether it is still running.
        let build = self.client.last_build(&self.job).await?;

        // Jenkins can report `building: false` a moment before it records the result.
        let result = match build.result.filter(|result| !result.is_empty()) {
            Some(result) if !build.building => result,
            _ => {
                return Ok(PollStep::Building {
                    number: build.number,
                })
            }
        };

        Ok(PollStep::Finished(BuildOutcome {
            job: self.job.name.clone(),
            number: build.number,
            result,
            console_url: console_url(&build.url),
            url: build.url,
            completed_at: Utc::now(),
        }))
    }
}
