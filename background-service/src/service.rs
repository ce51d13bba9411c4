use crate::jobs::{JobReport, JobRunner};
use crate::schedule::{Lifecycle, RunState, Schedule};
use crate::shutdown::sleep_or_cancel;
use chainpulse_core::{CoreError, ErrorExt, ScheduleConfig};
use chrono::Utc;
use futures::FutureExt;
use llm_interface::GenerationBackend;
use platform_client::PlatformAdapter;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The run loop. Owns the platform session through its [`JobRunner`] and
/// runs at most one job at a time.
pub struct BackgroundService<B, A> {
    jobs: JobRunner<B, A>,
    schedule: Schedule,
    state: RunState,
    tick_interval: Duration,
    failure_backoff: Duration,
}

impl<B, A> BackgroundService<B, A>
where
    B: GenerationBackend,
    A: PlatformAdapter,
{
    pub fn new(jobs: JobRunner<B, A>, schedule: Schedule, config: &ScheduleConfig) -> Self {
        Self {
            jobs,
            schedule,
            state: RunState::new(),
            tick_interval: config.tick_interval(),
            failure_backoff: config.failure_backoff(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Ticks until `token` is cancelled, then closes the platform session.
    /// A failed or panicking tick is logged and followed by the failure
    /// backoff; it never ends the loop.
    pub async fn run(&mut self, token: CancellationToken) {
        self.state.transition(Lifecycle::Active);
        info!(
            jobs = self.schedule.entries().len(),
            tick = ?self.tick_interval,
            "Run loop started"
        );

        while !token.is_cancelled() {
            let outcome = AssertUnwindSafe(self.tick(&token)).catch_unwind().await;
            let pause = match outcome {
                Ok(Ok(reports)) => {
                    debug!("Tick complete, {} jobs ran", reports.len());
                    self.tick_interval
                }
                Ok(Err(e)) => {
                    e.log_error();
                    warn!("Tick failed, backing off for {:?}", self.failure_backoff);
                    self.failure_backoff
                }
                Err(panic) => {
                    self.state.finish();
                    error!(
                        "Tick panicked: {}. Backing off for {:?}",
                        panic_message(panic.as_ref()),
                        self.failure_backoff
                    );
                    self.failure_backoff
                }
            };

            if !sleep_or_cancel(pause, &token).await {
                break;
            }
        }

        self.shutdown().await;
    }

    /// Runs every job that is due, in schedule order.
    pub async fn tick(&mut self, token: &CancellationToken) -> Result<Vec<JobReport>, CoreError> {
        if let Some(kind) = self.state.running() {
            return Err(CoreError::Internal {
                message: format!("{} job still marked as running", kind),
            });
        }

        let now = Utc::now();
        let mut reports = Vec::new();
        for kind in self.schedule.due_jobs(now, &self.state) {
            if token.is_cancelled() {
                break;
            }
            self.state.begin(kind, now);
            let report = self.jobs.run(kind, token).await;
            self.state.finish();
            reports.push(report);
        }
        Ok(reports)
    }

    async fn shutdown(&mut self) {
        self.state.transition(Lifecycle::ShuttingDown);
        if let Err(e) = self.jobs.adapter().close().await {
            e.log_warn();
        }
        self.state.transition(Lifecycle::Stopped);
        info!("Run loop stopped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
