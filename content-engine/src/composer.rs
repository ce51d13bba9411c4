use crate::classifier::{categorize, detect_keywords};
use crate::cleaning::{clean_reply, postprocess, strip_wrapping_quotes};
use crate::prompts::{build_prompt, build_reply_prompt, MarketContext};
use crate::thread::split_into_thread;
use chainpulse_core::{
    Category, ContentError, CoreError, GeneratedContent, KeywordSet, ObservedPost, ProjectEntry,
    SOFT_CHAR_LIMIT,
};
use chrono::NaiveDate;
use llm_interface::{FallbackChain, GenerationBackend};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Shapes raw model output. A single paragraph over the soft limit is split
/// on sentences; anything else goes through line cleaning.
pub fn shape(raw: &str) -> Result<GeneratedContent, ContentError> {
    let unquoted = strip_wrapping_quotes(raw);
    if !unquoted.contains('\n') && unquoted.chars().count() > SOFT_CHAR_LIMIT {
        let mut chunks = split_into_thread(unquoted);
        return match chunks.len() {
            0 => Err(ContentError::NoValidContent),
            1 => Ok(GeneratedContent::Single(chunks.remove(0))),
            _ => Ok(GeneratedContent::Thread(chunks)),
        };
    }
    postprocess(raw)
}

pub struct ContentComposer<B> {
    backend: Arc<B>,
    chain: FallbackChain,
}

impl<B: GenerationBackend> ContentComposer<B> {
    pub fn new(backend: Arc<B>, chain: FallbackChain) -> Self {
        Self { backend, chain }
    }

    /// Composes with a market context drawn at random.
    pub async fn compose(
        &self,
        project: &ProjectEntry,
        date: NaiveDate,
    ) -> Result<GeneratedContent, CoreError> {
        self.compose_with_context(project, MarketContext::random(), date)
            .await
    }

    pub async fn compose_with_context(
        &self,
        project: &ProjectEntry,
        context: MarketContext,
        date: NaiveDate,
    ) -> Result<GeneratedContent, CoreError> {
        let prompt = build_prompt(project, context, date);
        debug!(project = %project.name, context = ?context, "Generating post content");

        let generation = self.chain.generate(self.backend.as_ref(), &prompt).await?;
        let content = shape(&generation.text)?;

        info!(
            project = %project.name,
            model = %generation.model,
            chunks = content.len(),
            "Composed post content"
        );
        Ok(content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    pub text: String,
    pub category: Category,
    pub matched_keywords: BTreeSet<String>,
}

pub struct ReplyComposer<B> {
    backend: Arc<B>,
    chain: FallbackChain,
}

impl<B: GenerationBackend> ReplyComposer<B> {
    pub fn new(backend: Arc<B>, chain: FallbackChain) -> Self {
        Self { backend, chain }
    }

    pub async fn compose_reply(
        &self,
        post: &ObservedPost,
        keywords: &KeywordSet,
    ) -> Result<ReplyDraft, CoreError> {
        let matched_keywords = detect_keywords(&post.text, keywords);
        let category = categorize(&post.text, &matched_keywords);
        debug!(
            author = %post.author,
            category = %category,
            matched = matched_keywords.len(),
            "Classified observed post"
        );

        let prompt = build_reply_prompt(post, &matched_keywords, category);
        let generation = self.chain.generate(self.backend.as_ref(), &prompt).await?;
        let text = clean_reply(&generation.text)?;

        Ok(ReplyDraft {
            text,
            category,
            matched_keywords,
        })
    }
}
