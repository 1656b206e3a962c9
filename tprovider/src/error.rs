//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use tprovider::{ProviderError, ProviderErrorKind};
//!
//! let auth = ProviderError::authentication("API key expired");
//! assert!(!auth.retryable);
//! assert!(auth.kind.is_credential_fault());
//!
//! let quota = ProviderError::quota_exceeded("429 RESOURCE_EXHAUSTED");
//! assert!(quota.retryable);
//! assert_eq!(quota.kind, ProviderErrorKind::QuotaExceeded);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// Invalid, expired or suspended credential.
    Authentication,
    /// Temporary quota exhaustion for the credential in use.
    QuotaExceeded,
    /// The provider rejected the structure of the submitted turn log.
    MalformedHistory,
    /// Safety filter or explicit stop without content.
    ContentBlocked,
    Timeout,
    Unavailable,
    InvalidRequest,
    Transport,
    Other,
}

impl ProviderErrorKind {
    pub fn is_credential_fault(self) -> bool {
        matches!(self, Self::Authentication | Self::QuotaExceeded)
    }

    /// Faults that end the exchange immediately with an empty reply.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ContentBlocked | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::QuotaExceeded => "quota_exceeded",
            Self::MalformedHistory => "malformed_history",
            Self::ContentBlocked => "content_blocked",
            Self::Timeout => "timeout",
            Self::Unavailable => "unavailable",
            Self::InvalidRequest => "invalid_request",
            Self::Transport => "transport",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExceeded, message, true)
    }

    pub fn malformed_history(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedHistory, message, true)
    }

    pub fn content_blocked(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ContentBlocked, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, false)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}
