//! Unified facade over the tandem workspace crates.
//!
//! This crate is designed to be the single dependency for most applications.
//! It re-exports the core tandem crates and provides runtime wiring, JSON
//! configuration, and macros for common request-building flows.

mod error;
mod macros;

pub mod config;
pub mod prelude;
pub mod providers;
pub mod runtime;
pub mod util;

pub use tchat;
pub use tcommon;
pub use tmemory;
pub use tobserve;
pub use tprovider;

pub use tchat::{
    ChatError, ChatErrorKind, ConversationStore, CredentialOwnerStore, DriverConfig,
    EmptyReason, ExchangeContext, ExchangeHooks, ExchangeReply, ExchangeRequest, HistoryEditor,
    HistoryLimits, InMemoryConversationStore, InMemoryCredentialOwnerStore, LockRegistry,
    MEDIA_ONLY_REPLY, NoopExchangeHooks, RequestDriver, RequestDriverBuilder,
};
pub use tcommon::{BoxFuture, ConversationId, Deadline, GenerationOptions};
pub use tmemory::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    MemoryConversationStore, MemoryError, MemoryErrorKind, SqliteMemoryBackend,
    create_memory_backend, load_key_pool,
};
pub use tobserve::{MetricsExchangeHooks, SafeExchangeHooks, TracingExchangeHooks};
pub use tprovider::{
    Credential, FinishReason, FreezeOutcome, KeyPool, KeyPoolConfig, KeyPoolStats, MediaPart,
    ModelCandidate, Part, ProviderCall, ProviderClient, ProviderError, ProviderErrorKind,
    ProviderFuture, ProviderId, ProviderRegistry, ProviderResponse, RetryPolicy, Role,
    SafetyPolicy, SendConfig, ToolDeclaration, Turn,
};

pub use config::{API_KEYS_ENV, CandidateConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use providers::{ProviderBuildConfig, build_provider, build_provider_with_config};
pub use runtime::{
    RuntimeBundle, build_runtime, build_runtime_from_config, build_runtime_with, default_hooks,
    in_memory_backend,
};
pub use util::{exchange, gemini_candidates, model_turn, parse_provider_id, user_turn};

#[cfg(test)]
mod tests {
    use crate::{ProviderId, Role};

    #[test]
    fn tandem_turn_macro_creates_expected_turn() {
        let turn = crate::tandem_turn!(user => "hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text(), "hello");
    }

    #[test]
    fn tandem_turns_macro_builds_history() {
        let history = crate::tandem_turns![
            user => "Summarize the repo",
            model => "It orchestrates chat turns.",
        ];

        assert_eq!(history.len(), 2);
        assert!(history[0].is_user_plain());
        assert!(history[1].is_model_answer());
    }

    #[test]
    fn tandem_exchange_macro_supports_single_and_fallback_models() {
        let single = crate::tandem_exchange!("chat-1", "hi", "gemini-2.5-flash");
        assert_eq!(single.candidates.len(), 1);
        assert_eq!(single.candidates[0].provider, ProviderId::Gemini);

        let fallback = crate::tandem_exchange!("chat-1", "hi", ["a", "b", "c"]);
        assert_eq!(fallback.candidates.len(), 3);
    }
}
