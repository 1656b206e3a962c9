use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tcommon::{BoxFuture, ConversationId};
use tprovider::Turn;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;
use crate::types::{ConversationRecord, OwnerRecord};

/// One JSON file per conversation and per credential owner under `root`.
#[derive(Debug)]
pub struct FilesystemMemoryBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemMemoryBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        for directory in ["conversations", "owners"] {
            fs::create_dir_all(root.join(directory)).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create filesystem backend root: {error}"
                ))
            })?;
        }
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    fn conversation_path(&self, conversation_id: &ConversationId) -> PathBuf {
        self.root.join("conversations").join(format!(
            "{}.json",
            hex_encode(conversation_id.as_str().as_bytes())
        ))
    }

    fn owner_path(&self, owner: &str) -> PathBuf {
        self.root
            .join("owners")
            .join(format!("{}.json", hex_encode(owner.as_bytes())))
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, MemoryError> {
        self.lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem backend lock poisoned"))
    }
}

impl MemoryBackend for FilesystemMemoryBackend {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Turn>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            match read_json::<ConversationRecord>(&self.conversation_path(conversation_id))? {
                Some(record) => record.into_history(),
                None => Ok(Vec::new()),
            }
        })
    }

    fn replace_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let record = ConversationRecord::new(conversation_id.clone(), &history);
            write_json(&self.conversation_path(conversation_id), &record)
        })
    }

    fn load_owners<'a>(&'a self) -> BoxFuture<'a, Result<BTreeMap<String, Vec<String>>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let entries = fs::read_dir(self.root.join("owners")).map_err(|error| {
                MemoryError::storage(format!("failed to list owner files: {error}"))
            })?;

            let mut owners = BTreeMap::new();
            for entry in entries {
                let path = entry
                    .map_err(|error| {
                        MemoryError::storage(format!("failed to read owner entry: {error}"))
                    })?
                    .path();
                if path.extension().and_then(|extension| extension.to_str()) != Some("json") {
                    continue;
                }

                if let Some(record) = read_json::<OwnerRecord>(&path)? {
                    owners.insert(record.owner, record.secrets);
                }
            }
            Ok(owners)
        })
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

            let _guard = self.guard()?;
            let record = OwnerRecord {
                owner: owner.to_string(),
                secrets,
            };
            write_json(&self.owner_path(owner), &record)
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, MemoryError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path)
        .map_err(|error| MemoryError::storage(format!("failed to read state file: {error}")))?;
    let value = serde_json::from_slice::<T>(&bytes).map_err(|error| {
        MemoryError::corrupt(format!(
            "failed to deserialize {}: {error}",
            path.display()
        ))
    })?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), MemoryError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|error| MemoryError::storage(format!("failed to serialize state: {error}")))?;
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage("state file missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary state file: {error}"))
    })?;

    fs::rename(&tmp, path)
        .map_err(|error| MemoryError::storage(format!("failed to finalize state file: {error}")))
}

fn hex_encode(input: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(DIGITS[usize::from(byte >> 4)] as char);
        output.push(DIGITS[usize::from(byte & 0x0f)] as char);
    }
    output
}
