//! Common `tprovider` imports for downstream crates.

pub use crate::{
    Credential, ErrorClassifier, FinishReason, FreezeOutcome, FunctionCall, FunctionResponse,
    History, KeyPool, KeyPoolConfig, KeyPoolStats, MediaPart, ModelCandidate, Part, ProviderCall,
    ProviderClient, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId,
    ProviderRegistry, ProviderResponse, RawFault, RetryPolicy, Role, SafetyPolicy, SendConfig,
    ToolDeclaration, Turn,
};
pub use tcommon::{BoxFuture, ConversationId, Deadline, GenerationOptions};
