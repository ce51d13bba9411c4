use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Failures of a single generation backend call, and exhaustion of the
/// whole fallback chain.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Provider authentication failed: {provider}")]
    AuthenticationFailed { provider: String },

    #[error("Rate limit exceeded for {provider}. Retry after {retry_after} seconds")]
    RateLimitExceeded { provider: String, retry_after: u64 },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Provider service unavailable: {provider}")]
    ServiceUnavailable { provider: String },

    #[error("Request timeout for model {model}")]
    RequestTimeout { model: String },

    #[error("Empty response from model {model}")]
    EmptyResponse { model: String },

    #[error("Invalid response format from {provider}")]
    InvalidResponseFormat { provider: String },

    #[error("Generation unavailable after {attempts} attempts")]
    GenerationUnavailable { attempts: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("No valid content left after cleaning")]
    NoValidContent,

    #[error("Reply too short after cleaning: {length} characters")]
    ReplyTooShort { length: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Platform action {action} failed for {target}: {reason}")]
    ActionFailed {
        action: String,
        target: String,
        reason: String,
    },

    #[error("Platform authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("User not found: {handle}")]
    UserNotFound { handle: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Platform session unavailable: {reason}")]
    SessionUnavailable { reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid configuration format: {details}")]
    InvalidFormat { details: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
