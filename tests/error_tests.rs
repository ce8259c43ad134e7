//! Tests for the error system.

use parley::error::unified::*;
use parley::error::*;

#[test]
fn error_api_creation() {
    let err = AgentError::api(404, "Not found");
    assert!(matches!(&err, AgentError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: ParleyError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let network_error = reqwest::Client::new()
        .get("http://[::1")
        .build()
        .unwrap_err();
    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: ParleyError::init("empty API key"),
            expected_category: ErrorCategory::Initialization,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: ParleyError::NotReady,
            expected_category: ErrorCategory::NotReady,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::InitializeFirst,
        },
        Case {
            error: AgentError::Authentication("bad-key".to_string()).into(),
            expected_category: ErrorCategory::Authentication,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: AgentError::RateLimited {
                retry_after_ms: Some(1000),
            }
            .into(),
            expected_category: ErrorCategory::RateLimit,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentError::Network(network_error).into(),
            expected_category: ErrorCategory::Network,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentError::Timeout(30_000).into(),
            expected_category: ErrorCategory::Timeout,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::IncreaseTimeout,
        },
        Case {
            error: AgentError::api(500, "boom").into(),
            expected_category: ErrorCategory::Server,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: AgentError::api(400, "bad request").into(),
            expected_category: ErrorCategory::Api,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: AgentError::MalformedResponse("no choices".into()).into(),
            expected_category: ErrorCategory::MalformedResponse,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: ParleyError::Io(io_error),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckStorage,
        },
        Case {
            error: ParleyError::Serialization(serde_error),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckStorage,
        },
        Case {
            error: ParleyError::Configuration("bad timeout".into()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
    ];

    for case in cases {
        assert_eq!(
            case.error.category(),
            case.expected_category,
            "{:?}",
            case.error
        );
        assert_eq!(case.error.is_retryable(), case.expected_retryable, "{:?}", case.error);
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "{:?}",
            case.error
        );
    }
}

#[test]
fn init_errors_keep_their_cause() {
    let cause = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad header byte");
    let err = ParleyError::init_with_source("API key is not a valid header value", cause);
    let source = std::error::Error::source(&err).expect("source");
    assert_eq!(source.to_string(), "bad header byte");
}

#[test]
fn invocation_errors_expose_the_remote_cause() {
    let err = ParleyError::from(AgentError::Timeout(250));
    assert_eq!(err.to_string(), "Agent invocation failed: Timeout after 250ms");
    let source = std::error::Error::source(&err).expect("source");
    assert_eq!(source.to_string(), "Timeout after 250ms");
}
