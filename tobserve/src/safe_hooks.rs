use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tchat::{ChatError, EmptyReason, ExchangeContext, ExchangeHooks};
use tprovider::{Credential, FreezeOutcome, ProviderError};

/// Forwards to `H`, discarding any panic raised by the inner hook.
pub struct SafeExchangeHooks<H> {
    inner: H,
}

impl<H> SafeExchangeHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> ExchangeHooks for SafeExchangeHooks<H>
where
    H: ExchangeHooks,
{
    fn on_attempt_start(&self, context: ExchangeContext<'_>, credential: &Credential, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(context, credential, attempt)
        }));
    }

    fn on_attempt_failure(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        attempt: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_attempt_failure(context, credential, attempt, error)
        }));
    }

    fn on_credential_frozen(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        outcome: FreezeOutcome,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_credential_frozen(context, credential, outcome)
        }));
    }

    fn on_credential_removed(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        owners: &[String],
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_credential_removed(context, credential, owners)
        }));
    }

    fn on_model_fallback(&self, context: ExchangeContext<'_>, next_model: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_model_fallback(context, next_model)
        }));
    }

    fn on_history_repaired(&self, context: ExchangeContext<'_>, dropped_turns: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_history_repaired(context, dropped_turns)
        }));
    }

    fn on_retry_scheduled(&self, context: ExchangeContext<'_>, attempt: u32, delay: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_retry_scheduled(context, attempt, delay)
        }));
    }

    fn on_success(&self, context: ExchangeContext<'_>, attempts: u32, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(context, attempts, elapsed)
        }));
    }

    fn on_empty_reply(&self, context: ExchangeContext<'_>, reason: EmptyReason) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_empty_reply(context, reason)
        }));
    }

    fn on_persist_failure(&self, context: ExchangeContext<'_>, error: &ChatError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_persist_failure(context, error)
        }));
    }
}
