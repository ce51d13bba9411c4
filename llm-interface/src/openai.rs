use crate::GenerationBackend;
use chainpulse_core::{CoreError, GenerationConfig, LlmError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

const PROVIDER: &str = "openai";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const SYSTEM_PROMPT: &str = "You are a sharp, concise crypto research analyst writing for X. \
Never use hashtags unless asked, never give financial advice, keep every line under 270 characters.";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(config: &GenerationConfig) -> Result<Self, CoreError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::AuthenticationFailed {
                provider: PROVIDER.to_string(),
            })?;

        let http_client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl GenerationBackend for OpenAiProvider {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Requesting completion from {} with model {}", self.base_url, model);
        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Network error calling model {}: {}", model, e);
                if e.is_timeout() {
                    LlmError::RequestTimeout {
                        model: model.to_string(),
                    }
                } else {
                    LlmError::ServiceUnavailable {
                        provider: PROVIDER.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            warn!("Model {} request failed with status {}", model, status);
            return Err(map_status(status, retry_after, model));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion for model {}: {}", model, e);
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
            }
        })?;

        extract_content(body, model)
    }
}

fn map_status(status: StatusCode, retry_after: Option<u64>, model: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed {
            provider: PROVIDER.to_string(),
        },
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        408 => LlmError::RequestTimeout {
            model: model.to_string(),
        },
        429 => LlmError::RateLimitExceeded {
            provider: PROVIDER.to_string(),
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        // Unknown model ids usually surface as 400 on compatible gateways.
        400 | 422 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        },
        _ => LlmError::ServiceUnavailable {
            provider: PROVIDER.to_string(),
        },
    }
}

fn extract_content(body: ChatCompletionResponse, model: &str) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| LlmError::EmptyResponse {
            model: model.to_string(),
        })
}
