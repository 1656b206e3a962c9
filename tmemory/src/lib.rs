//! History and credential-owner persistence with tchat store adapters.

mod adapter;
mod backend;
mod backends;
mod error;
mod keys;
mod types;

pub mod prelude {
    pub use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
        MemoryConversationStore, MemoryError, MemoryErrorKind, SqliteMemoryBackend,
        create_default_memory_backend, create_memory_backend, load_key_pool,
    };
}

pub use adapter::MemoryConversationStore;
pub use backend::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    SqliteMemoryBackend, create_default_memory_backend, create_memory_backend,
};
pub use error::{MemoryError, MemoryErrorKind};
pub use keys::load_key_pool;
pub use types::{ConversationRecord, OwnerRecord, PersistedPart, PersistedTurn, SCHEMA_VERSION};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tchat::{ConversationStore, CredentialOwnerStore};
    use tcommon::ConversationId;
    use tprovider::{KeyPoolConfig, Part, Role, Turn};

    use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
        MemoryConversationStore, SqliteMemoryBackend, create_memory_backend, load_key_pool,
    };

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let unique = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("tmemory-{prefix}-{unique}"))
    }

    fn sample_history() -> Vec<Turn> {
        vec![
            Turn::user("what is in this picture?").with_part(Part::media(vec![9, 8, 7], "image/jpeg")),
            Turn::new(
                Role::Model,
                vec![Part::function_call("describe", json!({"detail": "low"}))],
            ),
            Turn::new(
                Role::User,
                vec![Part::function_response("describe", json!({"label": "dog"}))],
            ),
            Turn::model("A dog."),
        ]
    }

    async fn exercise_backend(backend: &dyn MemoryBackend) {
        let id = ConversationId::from("chat/with:odd chars");

        assert!(
            backend
                .load_history(&id)
                .await
                .expect("unknown conversation should load")
                .is_empty()
        );

        backend
            .replace_history(&id, sample_history())
            .await
            .expect("history should save");
        backend
            .replace_history(&id, sample_history())
            .await
            .expect("history should overwrite");

        let loaded = backend.load_history(&id).await.expect("history should load");
        assert_eq!(loaded, sample_history());

        backend
            .save_owner("alice", vec!["k1".to_string(), "k2".to_string()])
            .await
            .expect("owner should save");
        backend
            .save_owner("alice", vec!["k2".to_string()])
            .await
            .expect("owner should overwrite");
        backend
            .save_owner("bob", vec!["k3".to_string()])
            .await
            .expect("owner should save");

        let owners = backend.load_owners().await.expect("owners should load");
        assert_eq!(owners.len(), 2);
        assert_eq!(owners["alice"], vec!["k2".to_string()]);
        assert_eq!(owners["bob"], vec!["k3".to_string()]);

        let error = backend
            .save_owner(" ", Vec::new())
            .await
            .expect_err("blank owner must fail");
        assert_eq!(error.kind, crate::MemoryErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn in_memory_backend_round_trips_history_and_owners() {
        exercise_backend(&InMemoryMemoryBackend::new()).await;
    }

    #[tokio::test]
    async fn sqlite_backend_round_trips_history_and_owners() {
        let backend =
            SqliteMemoryBackend::new_in_memory().expect("sqlite backend should initialize");
        exercise_backend(&backend).await;
    }

    #[tokio::test]
    async fn filesystem_backend_round_trips_history_and_owners() {
        let root = temp_dir("filesystem");
        let backend = FilesystemMemoryBackend::new(&root).expect("fs backend should initialize");

        exercise_backend(&backend).await;

        let reopened = FilesystemMemoryBackend::new(&root).expect("fs backend should reopen");
        assert_eq!(
            reopened
                .load_history(&ConversationId::from("chat/with:odd chars"))
                .await
                .expect("history should load"),
            sample_history()
        );

        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }

    #[tokio::test]
    async fn sqlite_file_backend_survives_reopen() {
        let root = temp_dir("sqlite");
        let path = root.join("nested").join("tandem.sqlite3");
        let id = ConversationId::from("chat-1");

        {
            let backend = create_memory_backend(MemoryBackendConfig::Sqlite { path: path.clone() })
                .expect("sqlite backend should initialize");
            backend
                .replace_history(&id, vec![Turn::user("q"), Turn::model("a")])
                .await
                .expect("history should save");
        }

        let reopened = SqliteMemoryBackend::new(&path).expect("sqlite backend should reopen");
        assert_eq!(
            reopened.load_history(&id).await.expect("history should load"),
            vec![Turn::user("q"), Turn::model("a")]
        );

        drop(reopened);
        std::fs::remove_dir_all(&root).expect("temporary directory should be removable");
    }

    #[test]
    fn backend_config_deserializes_tagged_variants() {
        let config: MemoryBackendConfig =
            serde_json::from_str(r#"{"kind": "filesystem", "root": "/var/lib/tandem"}"#)
                .expect("config should parse");
        assert_eq!(
            config,
            MemoryBackendConfig::Filesystem {
                root: "/var/lib/tandem".into()
            }
        );

        let config: MemoryBackendConfig =
            serde_json::from_str(r#"{"kind": "in_memory"}"#).expect("config should parse");
        assert_eq!(config, MemoryBackendConfig::InMemory);
    }

    #[tokio::test]
    async fn conversation_store_adapter_reads_and_writes_history() {
        let backend: Arc<dyn MemoryBackend> = Arc::new(InMemoryMemoryBackend::new());
        let store = MemoryConversationStore::new(backend.clone());
        let id = ConversationId::from("chat-2");

        store
            .save_history(&id, vec![Turn::user("hello"), Turn::model("greetings")])
            .await
            .expect("save should work");
        store
            .save_owner("carol", vec!["k9".to_string()])
            .await
            .expect("owner save should work");

        let loaded = store.load_history(&id).await.expect("load should work");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].role, Role::Model);
        assert_eq!(
            backend.load_owners().await.expect("owners should load")["carol"],
            vec!["k9".to_string()]
        );
    }

    #[tokio::test]
    async fn key_pool_merges_static_and_owner_credentials() {
        let backend = InMemoryMemoryBackend::new();
        backend
            .save_owner("alice", vec!["shared".to_string(), "a1".to_string()])
            .await
            .expect("owner should save");
        backend
            .save_owner("bob", vec!["b1".to_string()])
            .await
            .expect("owner should save");

        let pool = load_key_pool(&backend, KeyPoolConfig::default(), ["shared", "static"])
            .await
            .expect("pool should load");

        let stats = pool.stats().expect("stats");
        assert_eq!(stats.total, 4);
        assert_eq!(
            pool.owner_credentials("alice")
                .expect("owner lookup")
                .iter()
                .map(|credential| credential.expose().to_string())
                .collect::<Vec<_>>(),
            vec!["shared", "a1"]
        );
    }
}
