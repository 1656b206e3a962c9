//! Provider contracts, turn model, credential pool and provider adapters.

pub mod adapters;
pub mod classify;
pub mod error;
pub mod keypool;
pub mod model;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod resilience;

pub use classify::{
    ErrorClassifier, HttpStatusClassifier, RawFault, classify_message, error_for_kind,
};
pub use error::{ProviderError, ProviderErrorKind};
pub use keypool::{Credential, FreezeOutcome, KeyPool, KeyPoolConfig, KeyPoolStats};
pub use model::{
    FinishReason, FunctionCall, FunctionResponse, History, MediaPart, ModelCandidate, Part,
    ProviderCall, ProviderId, ProviderResponse, Role, SafetyPolicy, SendConfig, ToolDeclaration,
    Turn, history_text_chars,
};
pub use provider::{ProviderClient, ProviderFuture};
pub use registry::ProviderRegistry;
pub use resilience::RetryPolicy;

#[cfg(feature = "provider-gemini")]
pub use adapters::gemini::{
    GeminiClient, GeminiErrorClassifier, GeminiHttpTransport, GeminiTransport,
};
