//! Conversation and credential-owner storage contracts with in-memory implementations.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tcommon::ConversationId;
use tprovider::Turn;

use crate::ChatError;

pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Ordered turn log per conversation. Unknown ids load as empty.
pub trait ConversationStore: Send + Sync {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> ChatFuture<'a, Result<Vec<Turn>, ChatError>>;

    fn save_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

/// Per-owner credential registries merged into the key pool.
pub trait CredentialOwnerStore: Send + Sync {
    fn load_owners<'a>(&'a self) -> ChatFuture<'a, Result<BTreeMap<String, Vec<String>>, ChatError>>;

    fn save_owner<'a>(
        &'a self,
        owner: &'a str,
        secrets: Vec<String>,
    ) -> ChatFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: Mutex<HashMap<ConversationId, Vec<Turn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> ChatFuture<'a, Result<Vec<Turn>, ChatError>> {
        Box::pin(async move {
            let conversations = self
                .conversations
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            Ok(conversations
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn save_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut conversations = self
                .conversations
                .lock()
                .map_err(|_| ChatError::store("conversation store lock poisoned"))?;

            conversations.insert(conversation_id.clone(), history);
            Ok(())
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialOwnerStore {
    owners: Mutex<BTreeMap<String, Vec<String>>>,
}

impl InMemoryCredentialOwnerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialOwnerStore for InMemoryCredentialOwnerStore {
    fn load_owners<'a>(&'a self) -> ChatFuture<'a, Result<BTreeMap<String, Vec<String>>, ChatError>> {
        Box::pin(async move {
            let owners = self
                .owners
                .lock()
                .map_err(|_| ChatError::store("credential owner store lock poisoned"))?;
            Ok(owners.clone())
        })
    }

    fn save_owner<'a>(
        &'a self,
        owner: &'a str,
        secrets: Vec<String>,
    ) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let mut owners = self
                .owners
                .lock()
                .map_err(|_| ChatError::store("credential owner store lock poisoned"))?;
            owners.insert(owner.to_string(), secrets);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_conversation_loads_empty_and_saves_replace() {
        let store = InMemoryConversationStore::new();
        let id = ConversationId::from("chat-1");

        assert!(store.load_history(&id).await.expect("load").is_empty());

        store
            .save_history(&id, vec![Turn::user("q"), Turn::model("a")])
            .await
            .expect("save");
        store
            .save_history(&id, vec![Turn::user("q2"), Turn::model("a2")])
            .await
            .expect("save");

        assert_eq!(
            store.load_history(&id).await.expect("load"),
            vec![Turn::user("q2"), Turn::model("a2")]
        );
    }

    #[tokio::test]
    async fn owner_store_round_trips_registries() {
        let store = InMemoryCredentialOwnerStore::new();
        store
            .save_owner("alice", vec!["k1".to_string(), "k2".to_string()])
            .await
            .expect("save");

        let owners = store.load_owners().await.expect("load");
        assert_eq!(owners.get("alice").map(Vec::len), Some(2));
    }
}
