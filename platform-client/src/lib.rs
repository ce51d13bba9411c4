//! Platform adapters: the X API v2 client, a dry-run stand-in, and the
//! retry machinery both share.

pub mod api;
pub mod dry_run;
pub mod retry;


pub use api::{XApiClient, XTweet, XUser};
pub use dry_run::DryRunAdapter;
pub use retry::{CircuitBreaker, CircuitBreakerState, RetryConfig, RetryExecutor, RetryMetrics};

use chainpulse_core::{CoreError, GeneratedContent, ObservedPost, PlatformConfig, PlatformMode};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// One logged-in session on the social platform. Calls are made one at a
/// time by the run loop that owns the session.
pub trait PlatformAdapter {
    /// Acquires the session. Failure here is fatal at startup.
    async fn connect(&self) -> Result<(), CoreError>;

    /// Publishes a single post, or a thread as a reply chain.
    async fn post(&self, content: &GeneratedContent) -> Result<(), CoreError>;

    async fn reply(&self, target: &ObservedPost, text: &str) -> Result<(), CoreError>;

    async fn follow(&self, handle: &str) -> Result<(), CoreError>;

    /// Latest original post of an account, if it has one.
    async fn fetch_latest(&self, handle: &str) -> Result<Option<ObservedPost>, CoreError>;

    async fn close(&self) -> Result<(), CoreError>;
}

/// The adapter selected by `platform.mode`.
#[derive(Debug)]
pub enum Platform {
    XApi(XApiClient),
    DryRun(DryRunAdapter),
}

impl Platform {
    /// `shutdown` interrupts retry waits of the X API client.
    pub fn from_config(
        config: &PlatformConfig,
        shutdown: &CancellationToken,
    ) -> Result<Self, CoreError> {
        match config.mode {
            PlatformMode::XApi => {
                info!("Using X API adapter at {}", config.api_base);
                let client = XApiClient::new(config)?.with_shutdown(shutdown.clone());
                Ok(Platform::XApi(client))
            }
            PlatformMode::DryRun => {
                info!("Using dry-run adapter, nothing will be published");
                Ok(Platform::DryRun(DryRunAdapter::new()))
            }
        }
    }
}

impl PlatformAdapter for Platform {
    async fn connect(&self) -> Result<(), CoreError> {
        match self {
            Platform::XApi(client) => client.connect().await,
            Platform::DryRun(adapter) => adapter.connect().await,
        }
    }

    async fn post(&self, content: &GeneratedContent) -> Result<(), CoreError> {
        match self {
            Platform::XApi(client) => client.post(content).await,
            Platform::DryRun(adapter) => adapter.post(content).await,
        }
    }

    async fn reply(&self, target: &ObservedPost, text: &str) -> Result<(), CoreError> {
        match self {
            Platform::XApi(client) => client.reply(target, text).await,
            Platform::DryRun(adapter) => adapter.reply(target, text).await,
        }
    }

    async fn follow(&self, handle: &str) -> Result<(), CoreError> {
        match self {
            Platform::XApi(client) => client.follow(handle).await,
            Platform::DryRun(adapter) => adapter.follow(handle).await,
        }
    }

    async fn fetch_latest(&self, handle: &str) -> Result<Option<ObservedPost>, CoreError> {
        match self {
            Platform::XApi(client) => client.fetch_latest(handle).await,
            Platform::DryRun(adapter) => adapter.fetch_latest(handle).await,
        }
    }

    async fn close(&self) -> Result<(), CoreError> {
        match self {
            Platform::XApi(client) => client.close().await,
            Platform::DryRun(adapter) => adapter.close().await,
        }
    }
}
