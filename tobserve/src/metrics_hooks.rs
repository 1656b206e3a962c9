//! Metrics-based exchange hooks.
//!
//! ```rust
//! use tchat::ExchangeHooks;
//! use tobserve::MetricsExchangeHooks;
//!
//! fn accepts_exchange_hooks(_hooks: &dyn ExchangeHooks) {}
//!
//! let hooks = MetricsExchangeHooks;
//! accepts_exchange_hooks(&hooks);
//! ```

use std::time::Duration;

use tchat::{ChatError, EmptyReason, ExchangeContext, ExchangeHooks};
use tprovider::{Credential, FreezeOutcome, ProviderError};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsExchangeHooks;

impl ExchangeHooks for MetricsExchangeHooks {
    fn on_attempt_start(&self, context: ExchangeContext<'_>, _credential: &Credential, _attempt: u32) {
        metrics::counter!(
            "tandem_exchange_attempt_start_total",
            "model" => context.model.to_string()
        )
        .increment(1);
    }

    fn on_attempt_failure(
        &self,
        context: ExchangeContext<'_>,
        _credential: &Credential,
        _attempt: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "tandem_exchange_attempt_failure_total",
            "model" => context.model.to_string(),
            "error_kind" => error.kind.as_str()
        )
        .increment(1);
    }

    fn on_credential_frozen(
        &self,
        _context: ExchangeContext<'_>,
        _credential: &Credential,
        outcome: FreezeOutcome,
    ) {
        metrics::counter!(
            "tandem_credential_frozen_total",
            "outcome" => format!("{outcome:?}")
        )
        .increment(1);
    }

    fn on_credential_removed(
        &self,
        _context: ExchangeContext<'_>,
        _credential: &Credential,
        _owners: &[String],
    ) {
        metrics::counter!("tandem_credential_removed_total").increment(1);
    }

    fn on_model_fallback(&self, context: ExchangeContext<'_>, next_model: &str) {
        metrics::counter!(
            "tandem_exchange_model_fallback_total",
            "model" => context.model.to_string(),
            "next_model" => next_model.to_string()
        )
        .increment(1);
    }

    fn on_history_repaired(&self, _context: ExchangeContext<'_>, dropped_turns: usize) {
        metrics::counter!("tandem_history_repaired_total").increment(1);
        metrics::histogram!("tandem_history_repair_dropped_turns").record(dropped_turns as f64);
    }

    fn on_retry_scheduled(&self, context: ExchangeContext<'_>, _attempt: u32, delay: Duration) {
        metrics::histogram!(
            "tandem_exchange_retry_delay_seconds",
            "model" => context.model.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, context: ExchangeContext<'_>, attempts: u32, elapsed: Duration) {
        metrics::counter!(
            "tandem_exchange_success_total",
            "model" => context.model.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "tandem_exchange_attempts_per_success",
            "model" => context.model.to_string()
        )
        .record(attempts as f64);
        metrics::histogram!(
            "tandem_exchange_duration_seconds",
            "model" => context.model.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_empty_reply(&self, _context: ExchangeContext<'_>, reason: EmptyReason) {
        metrics::counter!(
            "tandem_exchange_empty_reply_total",
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    fn on_persist_failure(&self, _context: ExchangeContext<'_>, error: &ChatError) {
        metrics::counter!(
            "tandem_store_persist_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
    }
}
