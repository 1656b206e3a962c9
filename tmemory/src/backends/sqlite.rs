use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use tcommon::{BoxFuture, ConversationId};
use tprovider::Turn;

use crate::backend::MemoryBackend;
use crate::error::MemoryError;
use crate::types::{SCHEMA_VERSION, decode_turns, encode_turns};

#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS conversations (
                conversation_id TEXT PRIMARY KEY,
                schema_version INTEGER NOT NULL,
                turns_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS credential_owners (
                owner TEXT PRIMARY KEY,
                secrets_json TEXT NOT NULL
            );
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn load_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
    ) -> BoxFuture<'a, Result<Vec<Turn>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let row = conn
                .query_row(
                    "
                    SELECT schema_version, turns_json
                    FROM conversations
                    WHERE conversation_id = ?1
                    ",
                    params![conversation_id.as_str()],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query conversation row: {error}"))
                })?;

            let Some((schema_version, turns_json)) = row else {
                return Ok(Vec::new());
            };

            if schema_version > i64::from(SCHEMA_VERSION) {
                return Err(MemoryError::corrupt(format!(
                    "conversation '{conversation_id}' uses unsupported schema version {schema_version}"
                )));
            }

            decode_turns(&turns_json)
        })
    }

    fn replace_history<'a>(
        &'a self,
        conversation_id: &'a ConversationId,
        history: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let turns_json = encode_turns(&history)?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO conversations (conversation_id, schema_version, turns_json)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(conversation_id) DO UPDATE SET
                    schema_version = excluded.schema_version,
                    turns_json = excluded.turns_json
                ",
                params![
                    conversation_id.as_str(),
                    i64::from(SCHEMA_VERSION),
                    turns_json,
                ],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to upsert conversation row: {error}"))
            })?;
            Ok(())
        })
    }

    fn load_owners<'a>(&'a self) -> BoxFuture<'a, Result<BTreeMap<String, Vec<String>>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare("SELECT owner, secrets_json FROM credential_owners ORDER BY owner ASC")
                .map_err(|error| {
                    MemoryError::storage(format!("failed to prepare owner query: {error}"))
                })?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query owner rows: {error}"))
                })?;

            let mut owners = BTreeMap::new();
            for row in rows {
                let (owner, secrets_json) = row.map_err(|error| {
                    MemoryError::storage(format!("failed to read owner row: {error}"))
                })?;
                let secrets = serde_json::from_str::<Vec<String>>(&secrets_json).map_err(
                    |error| {
                        MemoryError::corrupt(format!(
                            "failed to deserialize credentials for owner '{owner}': {error}"
                        ))
                    },
                )?;
                owners.insert(owner, secrets);
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

            let secrets_json = serde_json::to_string(&secrets).map_err(|error| {
                MemoryError::storage(format!("failed to serialize owner credentials: {error}"))
            })?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO credential_owners (owner, secrets_json)
                VALUES (?1, ?2)
                ON CONFLICT(owner) DO UPDATE SET secrets_json = excluded.secrets_json
                ",
                params![owner, secrets_json],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to upsert owner row: {error}"))
            })?;
            Ok(())
        })
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("TANDEM_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".tandem").join("tandem.sqlite3");
    }

    PathBuf::from("tandem.sqlite3")
}
