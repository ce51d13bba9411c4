use crate::GenerationBackend;
use chainpulse_core::{GenerationConfig, LlmError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Successful completion together with the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub model: String,
    pub text: String,
    pub attempts: usize,
}

/// Ordered list of model identifiers, primary first. Each model is tried
/// with the same prompt until one returns non-blank text.
#[derive(Debug, Clone)]
pub struct FallbackChain {
    models: Vec<String>,
    attempt_timeout: Duration,
}

impl FallbackChain {
    pub fn new(models: Vec<String>, attempt_timeout: Duration) -> Self {
        let models = models
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            models,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        // The HTTP client has its own timeout; this deadline also bounds
        // backends that never touch the network.
        Self::new(config.models.clone(), config.request_timeout())
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub async fn generate<B>(&self, backend: &B, prompt: &str) -> Result<Generation, LlmError>
    where
        B: GenerationBackend,
    {
        let mut attempts = 0;

        for model in &self.models {
            attempts += 1;
            debug!("Generation attempt {} using model {}", attempts, model);

            let outcome =
                match tokio::time::timeout(self.attempt_timeout, backend.complete(model, prompt))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::RequestTimeout {
                        model: model.clone(),
                    }),
                };

            match outcome {
                Ok(text) if !text.trim().is_empty() => {
                    if attempts > 1 {
                        info!(
                            "Model {} succeeded after {} failed attempts",
                            model,
                            attempts - 1
                        );
                    }
                    return Ok(Generation {
                        model: model.clone(),
                        text,
                        attempts,
                    });
                }
                Ok(_) => {
                    warn!(model = %model, "Model returned an empty response, trying next");
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Model failed, trying next");
                }
            }
        }

        warn!("All {} configured models failed", attempts);
        Err(LlmError::GenerationUnavailable { attempts })
    }
}
