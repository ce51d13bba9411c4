use crate::PlatformAdapter;
use chainpulse_core::{CoreError, GeneratedContent, ObservedPost};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Logs every action instead of performing it. Observes no posts, so reply
/// runs find nothing to answer.
#[derive(Debug, Default)]
pub struct DryRunAdapter {
    posts: AtomicUsize,
    replies: AtomicUsize,
}

impl DryRunAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> usize {
        self.posts.load(Ordering::Relaxed)
    }

    pub fn replies(&self) -> usize {
        self.replies.load(Ordering::Relaxed)
    }
}

impl PlatformAdapter for DryRunAdapter {
    async fn connect(&self) -> Result<(), CoreError> {
        info!("Dry run: no platform session opened");
        Ok(())
    }

    async fn post(&self, content: &GeneratedContent) -> Result<(), CoreError> {
        let total = content.len();
        for (index, chunk) in content.chunks().iter().enumerate() {
            info!(
                chunk = index + 1,
                total,
                chars = chunk.chars().count(),
                "Dry run post: {}",
                chunk
            );
        }
        self.posts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn reply(&self, target: &ObservedPost, text: &str) -> Result<(), CoreError> {
        info!(post = %target.url, "Dry run reply: {}", text);
        self.replies.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn follow(&self, handle: &str) -> Result<(), CoreError> {
        info!("Dry run follow: @{}", handle);
        Ok(())
    }

    async fn fetch_latest(&self, _handle: &str) -> Result<Option<ObservedPost>, CoreError> {
        Ok(None)
    }

    async fn close(&self) -> Result<(), CoreError> {
        info!(
            posts = self.posts(),
            replies = self.replies(),
            "Dry run session closed"
        );
        Ok(())
    }
}
