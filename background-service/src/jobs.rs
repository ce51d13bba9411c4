//! The two hourly jobs. Every per-item failure ends up in the job report;
//! nothing here aborts a batch.

use crate::schedule::JobKind;
use crate::shutdown::sleep_or_cancel;
use chainpulse_core::{Catalog, CoreError, ErrorExt, JobsConfig, ObservedPost, ProjectEntry};
use chrono::{DateTime, NaiveDate, Utc};
use content_engine::{ContentComposer, ReplyComposer};
use llm_interface::{FallbackChain, GenerationBackend};
use platform_client::PlatformAdapter;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Latest post is older than the freshness window.
    StaleContent { age: chrono::Duration },
    NoRecentPost,
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StaleContent { age } => {
                write!(f, "latest post is {} minutes old", age.num_minutes())
            }
            SkipReason::NoRecentPost => f.write_str("no recent post"),
            SkipReason::Cancelled => f.write_str("shutdown requested"),
        }
    }
}

#[derive(Debug)]
pub enum ItemOutcome {
    Completed,
    Skipped(SkipReason),
    Failed(CoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub kind: JobKind,
    pub run_id: Uuid,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Items left unprocessed because of shutdown are counted as skipped.
    pub cancelled: bool,
}

impl JobReport {
    pub fn new(kind: JobKind, run_id: Uuid) -> Self {
        Self {
            kind,
            run_id,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
        }
    }

    pub fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Completed => self.succeeded += 1,
            ItemOutcome::Skipped(_) => self.skipped += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }

    fn cancel_remaining(&mut self, remaining: usize) {
        if remaining > 0 {
            info!("Shutdown requested, skipping {} remaining items", remaining);
        }
        self.skipped += remaining;
        self.cancelled = true;
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }
}

/// A post exactly `window` old still counts as fresh.
pub fn is_fresh(post: &ObservedPost, now: DateTime<Utc>, window: chrono::Duration) -> bool {
    post.age(now) <= window
}

/// Everything a job run needs: the catalog, both composers and the
/// platform session.
pub struct JobRunner<B, A> {
    catalog: Arc<Catalog>,
    content: ContentComposer<B>,
    replies: ReplyComposer<B>,
    adapter: Arc<A>,
    config: JobsConfig,
}

impl<B, A> JobRunner<B, A>
where
    B: GenerationBackend,
    A: PlatformAdapter,
{
    pub fn new(
        catalog: Arc<Catalog>,
        backend: Arc<B>,
        chain: FallbackChain,
        adapter: Arc<A>,
        config: JobsConfig,
    ) -> Self {
        Self {
            catalog,
            content: ContentComposer::new(backend.clone(), chain.clone()),
            replies: ReplyComposer::new(backend, chain),
            adapter,
            config,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub async fn run(&self, kind: JobKind, token: &CancellationToken) -> JobReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("job", job = %kind, run_id = %run_id);

        async {
            let report = match kind {
                JobKind::Post => self.run_post_job(run_id, token).await,
                JobKind::Reply => self.run_reply_job(run_id, token).await,
            };
            info!(
                succeeded = report.succeeded,
                skipped = report.skipped,
                failed = report.failed,
                cancelled = report.cancelled,
                "Job finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Samples projects and publishes one generated post or thread for each,
    /// pacing between items.
    pub async fn run_post_job(&self, run_id: Uuid, token: &CancellationToken) -> JobReport {
        let projects = self.catalog.sample_projects(self.config.projects_per_run);
        let today = Utc::now().date_naive();
        let total = projects.len();
        let mut report = JobReport::new(JobKind::Post, run_id);
        info!(projects = total, "Post job started");

        for (index, project) in projects.iter().enumerate() {
            if token.is_cancelled() {
                report.cancel_remaining(total - index);
                break;
            }

            let outcome = self.post_project(project, today).await;
            match &outcome {
                ItemOutcome::Completed => info!(project = %project.name, "Posted"),
                ItemOutcome::Skipped(reason) => {
                    warn!(project = %project.name, "Skipped: {}", reason)
                }
                ItemOutcome::Failed(e) => error!(
                    project = %project.name,
                    code = e.error_code(),
                    transient = e.is_transient(),
                    "Post failed, continuing: {}",
                    e
                ),
            }
            report.record(&outcome);

            let remaining = total - index - 1;
            if remaining > 0 && !sleep_or_cancel(self.config.post_pacing(), token).await {
                report.cancel_remaining(remaining);
                break;
            }
        }

        report
    }

    async fn post_project(&self, project: &ProjectEntry, today: NaiveDate) -> ItemOutcome {
        let content = match self.content.compose(project, today).await {
            Ok(content) => content,
            Err(e) => return ItemOutcome::Failed(e),
        };
        match self.adapter.post(&content).await {
            Ok(()) => ItemOutcome::Completed,
            Err(e) => ItemOutcome::Failed(e),
        }
    }

    /// Samples monitored accounts and replies to each one's latest post
    /// when it is fresh enough.
    pub async fn run_reply_job(&self, run_id: Uuid, token: &CancellationToken) -> JobReport {
        let accounts = self.catalog.sample_accounts(self.config.accounts_per_run);
        let total = accounts.len();
        let mut report = JobReport::new(JobKind::Reply, run_id);
        info!(accounts = total, "Reply job started");

        for (index, handle) in accounts.iter().enumerate() {
            if token.is_cancelled() {
                report.cancel_remaining(total - index);
                break;
            }

            let outcome = self.reply_to_account(handle).await;
            match &outcome {
                ItemOutcome::Completed => info!(account = %handle, "Replied"),
                ItemOutcome::Skipped(reason) => warn!(account = %handle, "Skipped: {}", reason),
                ItemOutcome::Failed(e) => error!(
                    account = %handle,
                    code = e.error_code(),
                    transient = e.is_transient(),
                    "Reply failed, continuing: {}",
                    e
                ),
            }
            report.record(&outcome);

            let remaining = total - index - 1;
            if remaining > 0 && !sleep_or_cancel(self.config.reply_pacing(), token).await {
                report.cancel_remaining(remaining);
                break;
            }
        }

        report
    }

    async fn reply_to_account(&self, handle: &str) -> ItemOutcome {
        if let Err(e) = self.adapter.follow(handle).await {
            warn!(account = %handle, error = %e, "Follow failed, still checking latest post");
        }

        let post = match self.adapter.fetch_latest(handle).await {
            Ok(Some(post)) => post,
            Ok(None) => return ItemOutcome::Skipped(SkipReason::NoRecentPost),
            Err(e) => return ItemOutcome::Failed(e),
        };

        let now = Utc::now();
        if !is_fresh(&post, now, self.config.freshness_window()) {
            let age = post.age(now);
            return ItemOutcome::Skipped(SkipReason::StaleContent { age });
        }
        debug!(account = %handle, post = %post.url, "Latest post is fresh");

        let draft = match self
            .replies
            .compose_reply(&post, self.catalog.keywords())
            .await
        {
            Ok(draft) => draft,
            Err(e) => return ItemOutcome::Failed(e),
        };
        debug!(account = %handle, category = %draft.category, "Reply drafted");

        match self.adapter.reply(&post, &draft.text).await {
            Ok(()) => ItemOutcome::Completed,
            Err(e) => ItemOutcome::Failed(e),
        }
    }
}
