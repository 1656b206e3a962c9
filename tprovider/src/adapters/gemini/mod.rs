mod classify;
mod provider;
mod serde_api;
mod transport;
mod types;

pub use classify::GeminiErrorClassifier;
pub use provider::GeminiClient;
pub use transport::{GeminiHttpTransport, GeminiTransport};
pub use types::{GeminiFinishReason, GeminiOutput, GeminiRequest};
