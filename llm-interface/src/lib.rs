//! Text generation backends and the ordered model fallback chain.

pub mod fallback;
pub mod openai;

pub use fallback::{FallbackChain, Generation};
pub use openai::OpenAiProvider;

use chainpulse_core::LlmError;

/// A text generation service whose model is chosen per call.
pub trait GenerationBackend {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError>;
}
