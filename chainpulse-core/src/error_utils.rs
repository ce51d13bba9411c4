use crate::error::*;
use std::fmt::Display;
use tracing::{error, warn};

pub trait ErrorExt: Display {
    /// Whether a later attempt (the next item, the next scheduled run) may
    /// succeed without anyone changing configuration.
    fn is_transient(&self) -> bool;

    /// Stable code for log filtering, most specific variant first.
    fn error_code(&self) -> &'static str;

    /// One structured line at error level.
    fn log_error(&self) -> &Self
    where
        Self: Sized,
    {
        error!(
            code = self.error_code(),
            transient = self.is_transient(),
            "{}",
            self
        );
        self
    }

    fn log_warn(&self) -> &Self
    where
        Self: Sized,
    {
        warn!(
            code = self.error_code(),
            transient = self.is_transient(),
            "{}",
            self
        );
        self
    }
}

impl ErrorExt for CoreError {
    fn is_transient(&self) -> bool {
        match self {
            CoreError::Llm(e) => e.is_transient(),
            CoreError::Platform(e) => e.is_transient(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Llm(e) => e.error_code(),
            CoreError::Content(e) => e.error_code(),
            CoreError::Platform(e) => e.error_code(),
            CoreError::Config(e) => e.error_code(),
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::Internal { .. } => "INTERNAL",
        }
    }
}

impl ErrorExt for LlmError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimitExceeded { .. }
                | LlmError::ServiceUnavailable { .. }
                | LlmError::RequestTimeout { .. }
                | LlmError::EmptyResponse { .. }
                | LlmError::GenerationUnavailable { .. }
        )
    }

    fn error_code(&self) -> &'static str {
        match self {
            LlmError::AuthenticationFailed { .. } => "LLM_AUTH_FAILED",
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT",
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE",
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE",
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT",
            LlmError::EmptyResponse { .. } => "LLM_EMPTY_RESPONSE",
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE",
            LlmError::GenerationUnavailable { .. } => "LLM_GENERATION_UNAVAILABLE",
        }
    }
}

impl ErrorExt for ContentError {
    /// Model output varies run to run, so a rejected draft is not permanent.
    fn is_transient(&self) -> bool {
        true
    }

    fn error_code(&self) -> &'static str {
        match self {
            ContentError::NoValidContent => "CONTENT_NO_VALID_CONTENT",
            ContentError::ReplyTooShort { .. } => "CONTENT_REPLY_TOO_SHORT",
        }
    }
}

impl ErrorExt for PlatformError {
    fn is_transient(&self) -> bool {
        match self {
            PlatformError::RateLimitExceeded { .. } => true,
            PlatformError::RequestTimeout => true,
            PlatformError::ServerError { status_code } => *status_code >= 500,
            PlatformError::ActionFailed { .. } => true,
            _ => false,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            PlatformError::ActionFailed { .. } => "PLATFORM_ACTION_FAILED",
            PlatformError::AuthenticationFailed { .. } => "PLATFORM_AUTH_FAILED",
            PlatformError::RateLimitExceeded { .. } => "PLATFORM_RATE_LIMIT",
            PlatformError::UserNotFound { .. } => "PLATFORM_USER_NOT_FOUND",
            PlatformError::ServerError { .. } => "PLATFORM_SERVER_ERROR",
            PlatformError::RequestTimeout => "PLATFORM_TIMEOUT",
            PlatformError::InvalidResponse { .. } => "PLATFORM_INVALID_RESPONSE",
            PlatformError::SessionUnavailable { .. } => "PLATFORM_SESSION_UNAVAILABLE",
        }
    }
}

impl ErrorExt for ConfigError {
    fn is_transient(&self) -> bool {
        false
    }

    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND",
            ConfigError::InvalidFormat { .. } => "CONFIG_INVALID_FORMAT",
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR",
            ConfigError::ValidationFailed { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR",
        }
    }
}
