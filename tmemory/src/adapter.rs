//! Exposes a memory backend through the tchat storage contracts.

use std::collections::BTreeMap;
use std::sync::Arc;

use tchat::{ChatError, ChatFuture, ConversationStore, CredentialOwnerStore};
use tcommon::ConversationId;
use tprovider::Turn;

use crate::backend::MemoryBackend;

#[derive(Clone)]
pub struct MemoryConversationStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryConversationStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl ConversationStore for MemoryConversationStore {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> ChatFuture<'a, Result<Vec<Turn>, ChatError>> {
        Box::pin(async move {
            self.backend
                .load_history(conversation_id)
                .await
                .map_err(ChatError::from)
        })
    }

    fn save_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .replace_history(conversation_id, history)
                .await
                .map_err(ChatError::from)
        })
    }
}

impl CredentialOwnerStore for MemoryConversationStore {
    fn load_owners<'a>(&'a self) -> ChatFuture<'a, Result<BTreeMap<String, Vec<String>>, ChatError>> {
        Box::pin(async move { self.backend.load_owners().await.map_err(ChatError::from) })
    }

    fn save_owner<'a>(
        &'a self,
        owner: &'a str,
        secrets: Vec<String>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .save_owner(owner, secrets)
                .await
                .map_err(ChatError::from)
        })
    }
}
