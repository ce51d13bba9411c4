use chainpulse_core::{ConfigError, ContentError, CoreError, ErrorExt, LlmError, PlatformError};

#[test]
fn test_error_codes_name_the_specific_variant() {
    let llm_error = CoreError::Llm(LlmError::GenerationUnavailable { attempts: 4 });
    assert_eq!(llm_error.error_code(), "LLM_GENERATION_UNAVAILABLE");

    let content_error = CoreError::Content(ContentError::NoValidContent);
    assert_eq!(content_error.error_code(), "CONTENT_NO_VALID_CONTENT");

    let platform_error = CoreError::Platform(PlatformError::RequestTimeout);
    assert_eq!(platform_error.error_code(), "PLATFORM_TIMEOUT");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "api_key".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG_MISSING_FIELD");

    let internal = CoreError::Internal {
        message: "reply job still marked as running".to_string(),
    };
    assert_eq!(internal.error_code(), "INTERNAL");
}

#[test]
fn test_transient_errors() {
    let rate_limited = CoreError::Platform(PlatformError::RateLimitExceeded { retry_after: 60 });
    assert!(rate_limited.is_transient());

    let server_error = CoreError::Platform(PlatformError::ServerError { status_code: 503 });
    assert!(server_error.is_transient());

    let exhausted = CoreError::Llm(LlmError::GenerationUnavailable { attempts: 4 });
    assert!(exhausted.is_transient());

    let too_short = CoreError::Content(ContentError::ReplyTooShort { length: 3 });
    assert!(too_short.is_transient());
}

#[test]
fn test_permanent_errors() {
    let missing = CoreError::Config(ConfigError::MissingField {
        field: "api_key".to_string(),
    });
    assert!(!missing.is_transient());

    let revoked = CoreError::Platform(PlatformError::AuthenticationFailed {
        reason: "token revoked".to_string(),
    });
    assert!(!revoked.is_transient());

    let bad_key = CoreError::Llm(LlmError::AuthenticationFailed {
        provider: "openai".to_string(),
    });
    assert!(!bad_key.is_transient());
}

#[test]
fn test_nested_error_codes() {
    assert_eq!(
        ContentError::ReplyTooShort { length: 2 }.error_code(),
        "CONTENT_REPLY_TOO_SHORT"
    );
    assert_eq!(
        PlatformError::ActionFailed {
            action: "post".to_string(),
            target: "Monad".to_string(),
            reason: "duplicate content".to_string(),
        }
        .error_code(),
        "PLATFORM_ACTION_FAILED"
    );
    assert_eq!(
        LlmError::EmptyResponse {
            model: "gpt-4o".to_string()
        }
        .error_code(),
        "LLM_EMPTY_RESPONSE"
    );
}

#[test]
fn test_conversions_wrap_nested_errors() {
    let core: CoreError = PlatformError::UserNotFound {
        handle: "ghost".to_string(),
    }
    .into();
    assert!(matches!(
        core,
        CoreError::Platform(PlatformError::UserNotFound { ref handle }) if handle == "ghost"
    ));
    assert_eq!(core.to_string(), "Platform error: User not found: ghost");

    let parse_failure = toml::from_str::<toml::Value>("projects = [").unwrap_err();
    let core: CoreError = ConfigError::from(parse_failure).into();
    assert_eq!(core.error_code(), "CONFIG_PARSE_ERROR");
}

#[test]
fn test_logging_returns_the_error() {
    let error = CoreError::Platform(PlatformError::AuthenticationFailed {
        reason: "expired".to_string(),
    });
    assert!(std::ptr::eq(error.log_error(), &error));
    assert!(std::ptr::eq(error.log_warn(), &error));
}
