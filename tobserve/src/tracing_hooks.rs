//! Tracing-based exchange hooks.
//!
//! ```rust
//! use tchat::ExchangeHooks;
//! use tobserve::TracingExchangeHooks;
//!
//! fn accepts_exchange_hooks(_hooks: &dyn ExchangeHooks) {}
//!
//! let hooks = TracingExchangeHooks;
//! accepts_exchange_hooks(&hooks);
//! ```

use std::time::Duration;

use tchat::{ChatError, EmptyReason, ExchangeContext, ExchangeHooks};
use tprovider::{Credential, FreezeOutcome, ProviderError};

/// Queries are logged up to this many characters.
pub const QUERY_PREVIEW_CHARS: usize = 100;

pub fn query_preview(query: &str) -> String {
    let mut chars = query.chars();
    let preview = chars.by_ref().take(QUERY_PREVIEW_CHARS).collect::<String>();
    if chars.next().is_some() {
        format!("{preview}…")
    } else {
        preview
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExchangeHooks;

impl ExchangeHooks for TracingExchangeHooks {
    fn on_attempt_start(&self, context: ExchangeContext<'_>, credential: &Credential, attempt: u32) {
        tracing::debug!(
            phase = "exchange",
            event = "attempt_start",
            conversation_id = %context.conversation_id,
            model = context.model,
            credential = %credential.masked(),
            attempt
        );
    }

    fn on_attempt_failure(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        attempt: u32,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "exchange",
            event = "attempt_failure",
            conversation_id = %context.conversation_id,
            model = context.model,
            credential = %credential.masked(),
            query = %query_preview(context.query),
            attempt,
            error_kind = error.kind.as_str(),
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_credential_frozen(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        outcome: FreezeOutcome,
    ) {
        tracing::warn!(
            phase = "credentials",
            event = "frozen",
            conversation_id = %context.conversation_id,
            credential = %credential.masked(),
            outcome = ?outcome
        );
    }

    fn on_credential_removed(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        owners: &[String],
    ) {
        tracing::error!(
            phase = "credentials",
            event = "removed",
            conversation_id = %context.conversation_id,
            credential = %credential.masked(),
            owners = owners.len()
        );
    }

    fn on_model_fallback(&self, context: ExchangeContext<'_>, next_model: &str) {
        tracing::warn!(
            phase = "exchange",
            event = "model_fallback",
            conversation_id = %context.conversation_id,
            model = context.model,
            next_model
        );
    }

    fn on_history_repaired(&self, context: ExchangeContext<'_>, dropped_turns: usize) {
        tracing::warn!(
            phase = "history",
            event = "repaired",
            conversation_id = %context.conversation_id,
            model = context.model,
            dropped_turns
        );
    }

    fn on_retry_scheduled(&self, context: ExchangeContext<'_>, attempt: u32, delay: Duration) {
        tracing::info!(
            phase = "exchange",
            event = "retry_scheduled",
            conversation_id = %context.conversation_id,
            model = context.model,
            attempt,
            delay_ms = delay.as_millis() as u64
        );
    }

    fn on_success(&self, context: ExchangeContext<'_>, attempts: u32, elapsed: Duration) {
        tracing::info!(
            phase = "exchange",
            event = "success",
            conversation_id = %context.conversation_id,
            model = context.model,
            attempts,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_empty_reply(&self, context: ExchangeContext<'_>, reason: EmptyReason) {
        tracing::warn!(
            phase = "exchange",
            event = "empty_reply",
            conversation_id = %context.conversation_id,
            model = context.model,
            query = %query_preview(context.query),
            reason = reason.as_str()
        );
    }

    fn on_persist_failure(&self, context: ExchangeContext<'_>, error: &ChatError) {
        tracing::error!(
            phase = "store",
            event = "persist_failure",
            conversation_id = %context.conversation_id,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
