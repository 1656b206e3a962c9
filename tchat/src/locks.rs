//! Per-conversation mutual exclusion shared by the driver and the editor.
//!
//! ```rust
//! use tchat::LockRegistry;
//! use tcommon::ConversationId;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let locks = LockRegistry::new();
//! let id = ConversationId::from("chat-1");
//!
//! let guard = locks.lock(&id).await.expect("lock should be granted");
//! assert!(locks.try_lock(&id).expect("registry lock").is_none());
//! drop(guard);
//! assert!(locks.try_lock(&id).expect("registry lock").is_some());
//! # }
//! ```

use std::sync::{Arc, Mutex};

use tcommon::{ConversationId, Deadline, Registry};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::ChatError;

pub type ConversationGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<Registry<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `conversation_id`, created on first use and kept afterwards.
    pub fn handle(&self, conversation_id: &ConversationId) -> Result<Arc<AsyncMutex<()>>, ChatError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| ChatError::store("lock registry poisoned"))?;

        Ok(locks
            .get_or_insert_with(conversation_id.clone(), || Arc::new(AsyncMutex::new(())))
            .clone())
    }

    pub async fn lock(&self, conversation_id: &ConversationId) -> Result<ConversationGuard, ChatError> {
        Ok(self.handle(conversation_id)?.lock_owned().await)
    }

    /// Waits for the lock no longer than `deadline`.
    pub async fn lock_until(
        &self,
        conversation_id: &ConversationId,
        deadline: Deadline,
    ) -> Result<ConversationGuard, ChatError> {
        let handle = self.handle(conversation_id)?;
        tokio::time::timeout(deadline.remaining(), handle.lock_owned())
            .await
            .map_err(|_| {
                ChatError::timeout(format!(
                    "timed out waiting for conversation lock '{conversation_id}'"
                ))
            })
    }

    pub fn try_lock(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<ConversationGuard>, ChatError> {
        Ok(self.handle(conversation_id)?.try_lock_owned().ok())
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_conversation_shares_one_lock() {
        let locks = LockRegistry::new();
        let id = ConversationId::from("chat-1");

        let first = locks.handle(&id).expect("handle");
        let second = locks.handle(&id).expect("handle");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(locks.len(), 1);

        locks.handle(&ConversationId::from("chat-2")).expect("handle");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn lock_until_gives_up_at_the_deadline() {
        let locks = LockRegistry::new();
        let id = ConversationId::from("busy");
        let _held = locks.lock(&id).await.expect("first lock");

        let error = locks
            .lock_until(&id, Deadline::after(Duration::from_millis(20)))
            .await
            .expect_err("second lock must time out");
        assert_eq!(error.kind, crate::ChatErrorKind::Timeout);
    }

    #[tokio::test]
    async fn different_conversations_do_not_block_each_other() {
        let locks = LockRegistry::new();
        let _a = locks.lock(&ConversationId::from("a")).await.expect("lock a");

        let b = locks
            .lock_until(
                &ConversationId::from("b"),
                Deadline::after(Duration::from_millis(20)),
            )
            .await;
        assert!(b.is_ok());
    }
}
