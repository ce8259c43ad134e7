//! Error types for Parley.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Failure reported by a remote agent or by the machinery that drives it.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Execution context error: {0}")]
    Runtime(String),
}

impl AgentError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            Self::Runtime(_) => ErrorCategory::Runtime,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Primary error type for all Parley operations.
#[derive(Error, Debug)]
pub enum ParleyError {
    #[error("Agent initialization failed: {reason}")]
    Init {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Agent is not initialized")]
    NotReady,

    #[error("Agent invocation failed: {0}")]
    Invocation(#[source] AgentError),

    #[error("History store error: {0}")]
    History(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ParleyError {
    /// Create an initialization error without an underlying cause.
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an initialization error wrapping the cause reported by the agent library.
    pub fn init_with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Init {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Init { .. } => ErrorCategory::Initialization,
            Self::NotReady => ErrorCategory::NotReady,
            Self::Invocation(inner) => inner.category(),
            Self::History(_) | Self::Io(_) | Self::Serialization(_) => ErrorCategory::Storage,
            Self::Configuration(_) | Self::Toml(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        self.category().recovery_suggestion()
    }
}

impl From<AgentError> for ParleyError {
    fn from(err: AgentError) -> Self {
        Self::Invocation(err)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ParleyError>;
