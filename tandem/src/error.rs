//! Facade errors raised while assembling a runtime.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tchat::ChatError;
use tmemory::MemoryError;
use tprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    Provider,
    Memory,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(RuntimeErrorKind::Config, message)
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for RuntimeError {}

impl From<ProviderError> for RuntimeError {
    fn from(error: ProviderError) -> Self {
        Self::new(RuntimeErrorKind::Provider, error.to_string())
    }
}

impl From<MemoryError> for RuntimeError {
    fn from(error: MemoryError) -> Self {
        Self::new(RuntimeErrorKind::Memory, error.to_string())
    }
}

impl From<ChatError> for RuntimeError {
    fn from(error: ChatError) -> Self {
        Self::new(RuntimeErrorKind::Chat, error.to_string())
    }
}
