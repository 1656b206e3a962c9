//! Gemini-specific failure classification.

use crate::{
    ErrorClassifier, HttpStatusClassifier, ProviderError, ProviderErrorKind, RawFault,
    classify_message, error_for_kind,
};

use super::serde_api::parse_error_envelope;

/// Reads `error.details[].reason` and `error.status` before falling back to
/// HTTP status and message text.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiErrorClassifier;

impl GeminiErrorClassifier {
    /// Classifies a non-success HTTP response body.
    pub fn classify_response(&self, status: u16, body: &str) -> ProviderError {
        match parse_error_envelope(body) {
            Some(error) => {
                let message = if error.message.trim().is_empty() {
                    format!("Gemini request failed with status {status}")
                } else {
                    error.message.clone()
                };
                let mut fault = RawFault::new(&message).with_status(error.code.unwrap_or(status));
                if let Some(status_text) = error.status.as_deref() {
                    fault = fault.with_status_text(status_text);
                }
                if let Some(reason) = error.reason() {
                    fault = fault.with_reason(reason);
                }
                self.classify(&fault)
            }
            None => {
                let message = if body.trim().is_empty() {
                    format!("Gemini request failed with status {status}")
                } else {
                    body.trim().to_string()
                };
                self.classify(&RawFault::new(&message).with_status(status))
            }
        }
    }

    fn kind_from_codes(fault: &RawFault<'_>) -> Option<ProviderErrorKind> {
        match fault.reason {
            Some("API_KEY_INVALID" | "API_KEY_EXPIRED" | "API_KEY_SERVICE_BLOCKED") => {
                return Some(ProviderErrorKind::Authentication);
            }
            Some("RATE_LIMIT_EXCEEDED") => return Some(ProviderErrorKind::QuotaExceeded),
            _ => {}
        }

        match fault.status_text? {
            "PERMISSION_DENIED" | "UNAUTHENTICATED" => Some(ProviderErrorKind::Authentication),
            "RESOURCE_EXHAUSTED" => Some(ProviderErrorKind::QuotaExceeded),
            "DEADLINE_EXCEEDED" => Some(ProviderErrorKind::Timeout),
            "UNAVAILABLE" | "INTERNAL" => Some(ProviderErrorKind::Unavailable),
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" => match classify_message(fault.message) {
                Some(
                    kind @ (ProviderErrorKind::MalformedHistory
                    | ProviderErrorKind::Authentication),
                ) => Some(kind),
                _ => Some(ProviderErrorKind::InvalidRequest),
            },
            _ => None,
        }
    }
}

impl ErrorClassifier for GeminiErrorClassifier {
    fn classify(&self, fault: &RawFault<'_>) -> ProviderError {
        if fault.timed_out {
            return ProviderError::timeout(fault.message);
        }

        match Self::kind_from_codes(fault) {
            Some(kind) => error_for_kind(kind, fault.message),
            None => HttpStatusClassifier.classify(fault),
        }
    }
}
