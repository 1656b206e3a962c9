//! Mapping raw provider failures onto [`ProviderErrorKind`].
//!
//! Structured signals (transport timeouts, HTTP status, provider status
//! strings) are consulted first. Message substrings are only a fallback.
//!
//! ```rust
//! use tprovider::{ErrorClassifier, HttpStatusClassifier, ProviderErrorKind, RawFault};
//!
//! let classifier = HttpStatusClassifier;
//! let fault = RawFault::new("Resource has been exhausted").with_status(429);
//!
//! assert_eq!(classifier.classify(&fault).kind, ProviderErrorKind::QuotaExceeded);
//! ```

use crate::{ProviderError, ProviderErrorKind};

/// An unclassified provider failure as observed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawFault<'a> {
    pub status: Option<u16>,
    /// Provider status string such as `RESOURCE_EXHAUSTED`.
    pub status_text: Option<&'a str>,
    /// Provider-specific detail reason such as `API_KEY_INVALID`.
    pub reason: Option<&'a str>,
    pub message: &'a str,
    pub timed_out: bool,
}

impl<'a> RawFault<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_status_text(mut self, status_text: &'a str) -> Self {
        self.status_text = Some(status_text);
        self
    }

    pub fn with_reason(mut self, reason: &'a str) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn timed_out(mut self) -> Self {
        self.timed_out = true;
        self
    }
}

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, fault: &RawFault<'_>) -> ProviderError;
}

/// Builds an error of `kind` with that kind's default retry flag.
pub fn error_for_kind(kind: ProviderErrorKind, message: impl Into<String>) -> ProviderError {
    match kind {
        ProviderErrorKind::Authentication => ProviderError::authentication(message),
        ProviderErrorKind::QuotaExceeded => ProviderError::quota_exceeded(message),
        ProviderErrorKind::MalformedHistory => ProviderError::malformed_history(message),
        ProviderErrorKind::ContentBlocked => ProviderError::content_blocked(message),
        ProviderErrorKind::Timeout => ProviderError::timeout(message),
        ProviderErrorKind::Unavailable => ProviderError::unavailable(message),
        ProviderErrorKind::InvalidRequest => ProviderError::invalid_request(message),
        ProviderErrorKind::Transport => ProviderError::transport(message),
        ProviderErrorKind::Other => ProviderError::other(message),
    }
}

/// Substring fallback for providers that only surface free text.
pub fn classify_message(message: &str) -> Option<ProviderErrorKind> {
    let lower = message.to_ascii_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

    if is_turn_order_violation(&lower) {
        return Some(ProviderErrorKind::MalformedHistory);
    }

    if contains_any(&[
        "api key expired",
        "api_key_invalid",
        "api key not valid",
        "permission_denied",
        "unauthenticated",
    ]) {
        return Some(ProviderErrorKind::Authentication);
    }

    if contains_any(&["429", "resource_exhausted", "resource has been exhausted", "quota"]) {
        return Some(ProviderErrorKind::QuotaExceeded);
    }

    if contains_any(&["deadline_exceeded", "deadline exceeded", "timed out", "timeout"]) {
        return Some(ProviderErrorKind::Timeout);
    }

    if contains_any(&["503", "overloaded", "unavailable"]) {
        return Some(ProviderErrorKind::Unavailable);
    }

    None
}

pub(crate) fn is_turn_order_violation(lower_message: &str) -> bool {
    lower_message.contains("function response turn comes immediately after a function call turn")
        || lower_message.contains("function call turn comes immediately after")
        || (lower_message.contains("function response")
            && lower_message.contains("function call")
            && lower_message.contains("turn"))
}

/// Generic HTTP status mapping with message fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpStatusClassifier;

impl ErrorClassifier for HttpStatusClassifier {
    fn classify(&self, fault: &RawFault<'_>) -> ProviderError {
        if fault.timed_out {
            return ProviderError::timeout(fault.message);
        }

        let kind = match fault.status {
            Some(401 | 403) => ProviderErrorKind::Authentication,
            Some(429) => ProviderErrorKind::QuotaExceeded,
            Some(408 | 504) => ProviderErrorKind::Timeout,
            Some(500 | 502 | 503) => ProviderErrorKind::Unavailable,
            Some(400 | 422) => match classify_message(fault.message) {
                Some(
                    kind @ (ProviderErrorKind::MalformedHistory
                    | ProviderErrorKind::Authentication),
                ) => kind,
                _ => ProviderErrorKind::InvalidRequest,
            },
            Some(_) => classify_message(fault.message).unwrap_or(ProviderErrorKind::Other),
            None => classify_message(fault.message).unwrap_or(ProviderErrorKind::Transport),
        };

        error_for_kind(kind, fault.message)
    }
}
