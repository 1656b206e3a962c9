//! Common imports for most tandem applications.

pub use crate::{
    build_provider, build_runtime, build_runtime_from_config, build_runtime_with, default_hooks,
    exchange, gemini_candidates, in_memory_backend, model_turn, parse_provider_id, user_turn,
};
pub use crate::{tandem_exchange, tandem_turn, tandem_turns};
pub use crate::{
    BoxFuture, ChatError, ConversationId, ConversationStore, Credential, Deadline, DriverConfig,
    ExchangeHooks, ExchangeReply, ExchangeRequest, HistoryEditor, KeyPool, MemoryBackend,
    MemoryBackendConfig, ModelCandidate, Part, ProviderClient, ProviderError, ProviderId,
    RequestDriver, Role, RuntimeBundle, RuntimeConfig, RuntimeError, Turn,
};
