//! Memory backend trait, backend selection and the in-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tcommon::{BoxFuture, ConversationId};
use tprovider::Turn;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;

pub use crate::backends::filesystem::FilesystemMemoryBackend;
pub use crate::backends::sqlite::SqliteMemoryBackend;

pub trait MemoryBackend: Send + Sync {
    /// Stored turns for `conversation_id`; empty when nothing was stored.
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Turn>, MemoryError>>;

    fn replace_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn load_owners<'a>(&'a self) -> BoxFuture<'a, Result<BTreeMap<String, Vec<String>>, MemoryError>>;

    fn save_owner<'a>(
        &'a self,
        owner: &'a str,
        secrets: Vec<String>,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryBackendConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_memory_backend(
    config: MemoryBackendConfig,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match config {
        MemoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteMemoryBackend::new(path)?)),
        MemoryBackendConfig::Filesystem { root } => {
            Ok(Arc::new(FilesystemMemoryBackend::new(root)?))
        }
        MemoryBackendConfig::InMemory => Ok(Arc::new(InMemoryMemoryBackend::new())),
    }
}

pub fn create_default_memory_backend() -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    create_memory_backend(MemoryBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    state: Mutex<InMemoryState>,
}

#[derive(Debug, Default)]
struct InMemoryState {
    conversations: HashMap<ConversationId, Vec<Turn>>,
    owners: BTreeMap<String, Vec<String>>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, MemoryError> {
        self.state
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Turn>, MemoryError>> {
        Box::pin(async move {
            Ok(self
                .state()?
                .conversations
                .get(conversation_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn replace_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            self.state()?
                .conversations
                .insert(conversation_id.clone(), history);
            Ok(())
        })
    }

    fn load_owners<'a>(&'a self) -> BoxFuture<'a, Result<BTreeMap<String, Vec<String>>, MemoryError>> {
        Box::pin(async move { Ok(self.state()?.owners.clone()) })
    }

    fn save_owner<'a>(
        &'a self,
        owner: &'a str,
        secrets: Vec<String>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            if owner.trim().is_empty() {
                return Err(MemoryError::invalid_request("owner must not be empty"));
            }

            self.state()?.owners.insert(owner.to_string(), secrets);
            Ok(())
        })
    }
}
