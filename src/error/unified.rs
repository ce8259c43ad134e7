//! Error classification and recovery hints.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Credentials were missing, malformed, or rejected.
    Initialization,
    /// An operation required a live agent handle.
    NotReady,
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    /// The remote answered with something that is not a usable reply.
    MalformedResponse,
    /// The bridge could not build or join an execution context.
    Runtime,
    Storage,
    Configuration,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    InitializeFirst,
    CheckConfiguration,
    IncreaseTimeout,
    CheckStorage,
    ContactSupport,
}

impl ErrorCategory {
    /// Whether an error in this category may succeed if retried unchanged.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Network | Self::Timeout | Self::Server
        )
    }

    pub fn recovery_suggestion(self) -> RecoverySuggestion {
        match self {
            Self::Initialization | Self::Authentication => RecoverySuggestion::CheckCredentials,
            Self::NotReady => RecoverySuggestion::InitializeFirst,
            Self::RateLimit | Self::Network | Self::Server => RecoverySuggestion::RetryWithBackoff,
            Self::Timeout => RecoverySuggestion::IncreaseTimeout,
            Self::Configuration => RecoverySuggestion::CheckConfiguration,
            Self::Storage => RecoverySuggestion::CheckStorage,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}
