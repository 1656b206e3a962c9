//! Exchange orchestration over model providers: history hygiene, credential
//! rotation, model fallback and conversation edits.

mod config;
mod driver;
mod edit;
mod error;
pub mod history;
mod hooks;
mod locks;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ConversationStore, CredentialOwnerStore, DriverConfig,
        EmptyReason, ExchangeContext, ExchangeHooks, ExchangeReply, ExchangeRequest,
        HistoryEditor, HistoryLimits, InMemoryConversationStore, InMemoryCredentialOwnerStore,
        LockRegistry, NoopExchangeHooks, RequestDriver, RequestDriverBuilder,
    };
    pub use tcommon::{ConversationId, Deadline};
}

pub use config::{DriverConfig, MAX_TOKENS_RANGE, RepeatCollapse, TEMPERATURE_RANGE};
pub use driver::{MEDIA_ONLY_REPLY, RequestDriver, RequestDriverBuilder};
pub use edit::{HistoryEditor, render_transcript};
pub use error::{ChatError, ChatErrorKind};
pub use history::{HistoryLimits, MEDIA_PLACEHOLDER};
pub use hooks::{EmptyReason, ExchangeContext, ExchangeHooks, NoopExchangeHooks};
pub use locks::{ConversationGuard, LockRegistry};
pub use store::{
    ChatFuture, ConversationStore, CredentialOwnerStore, InMemoryConversationStore,
    InMemoryCredentialOwnerStore,
};
pub use types::{DEFAULT_EXCHANGE_TIMEOUT, ExchangeReply, ExchangeRequest};
