//! Decision-point callbacks emitted by the request driver.

use std::time::Duration;

use tcommon::ConversationId;
use tprovider::{Credential, FreezeOutcome, ProviderError};

use crate::ChatError;

/// What the driver was working on when a hook fired.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeContext<'a> {
    pub conversation_id: &'a ConversationId,
    /// Empty until a model candidate has been selected.
    pub model: &'a str,
    pub query: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    BlankQuery,
    NoCandidates,
    DeadlineExpired,
    LockUnavailable,
    HistoryUnavailable,
    NoCredential,
    ContentBlocked,
    ProviderTimeout,
    EmptyAnswer,
    LeakedToolCall,
    CandidatesExhausted,
}

impl EmptyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlankQuery => "blank_query",
            Self::NoCandidates => "no_candidates",
            Self::DeadlineExpired => "deadline_expired",
            Self::LockUnavailable => "lock_unavailable",
            Self::HistoryUnavailable => "history_unavailable",
            Self::NoCredential => "no_credential",
            Self::ContentBlocked => "content_blocked",
            Self::ProviderTimeout => "provider_timeout",
            Self::EmptyAnswer => "empty_answer",
            Self::LeakedToolCall => "leaked_tool_call",
            Self::CandidatesExhausted => "candidates_exhausted",
        }
    }
}

pub trait ExchangeHooks: Send + Sync {
    fn on_attempt_start(&self, _context: ExchangeContext<'_>, _credential: &Credential, _attempt: u32) {}

    fn on_attempt_failure(
        &self,
        _context: ExchangeContext<'_>,
        _credential: &Credential,
        _attempt: u32,
        _error: &ProviderError,
    ) {
    }

    fn on_credential_frozen(
        &self,
        _context: ExchangeContext<'_>,
        _credential: &Credential,
        _outcome: FreezeOutcome,
    ) {
    }

    fn on_credential_removed(
        &self,
        _context: ExchangeContext<'_>,
        _credential: &Credential,
        _owners: &[String],
    ) {
    }

    fn on_model_fallback(&self, _context: ExchangeContext<'_>, _next_model: &str) {}

    fn on_history_repaired(&self, _context: ExchangeContext<'_>, _dropped_turns: usize) {}

    fn on_retry_scheduled(&self, _context: ExchangeContext<'_>, _attempt: u32, _delay: Duration) {}

    fn on_success(&self, _context: ExchangeContext<'_>, _attempts: u32, _elapsed: Duration) {}

    fn on_empty_reply(&self, _context: ExchangeContext<'_>, _reason: EmptyReason) {}

    fn on_persist_failure(&self, _context: ExchangeContext<'_>, _error: &ChatError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExchangeHooks;

impl ExchangeHooks for NoopExchangeHooks {}
