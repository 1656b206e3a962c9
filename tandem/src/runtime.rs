//! Runtime wiring helpers for the exchange driver.

use std::sync::Arc;

use crate::error::RuntimeError;
use crate::providers::{ProviderBuildConfig, build_provider_with_config};
use crate::{
    ExchangeHooks, HistoryEditor, InMemoryMemoryBackend, KeyPool, MemoryBackend,
    MemoryConversationStore, ModelCandidate, ProviderClient, ProviderId, RequestDriver,
    RuntimeConfig, SafeExchangeHooks, TracingExchangeHooks, create_memory_backend, load_key_pool,
};

#[derive(Clone)]
pub struct RuntimeBundle {
    pub memory: Arc<dyn MemoryBackend>,
    pub keys: Arc<KeyPool>,
    pub driver: RequestDriver,
    pub editor: HistoryEditor,
    /// Fallback order for requests that name no candidates.
    pub candidates: Vec<ModelCandidate>,
}

pub fn in_memory_backend() -> Arc<dyn MemoryBackend> {
    Arc::new(InMemoryMemoryBackend::new())
}

/// Tracing hooks behind panic isolation.
pub fn default_hooks() -> Arc<dyn ExchangeHooks> {
    Arc::new(SafeExchangeHooks::new(TracingExchangeHooks))
}

/// In-memory runtime around `provider` with the given static keys.
pub async fn build_runtime<I, S>(
    provider: Arc<dyn ProviderClient>,
    api_keys: I,
) -> Result<RuntimeBundle, RuntimeError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let config = RuntimeConfig {
        api_keys: api_keys.into_iter().map(Into::into).collect(),
        ..RuntimeConfig::default()
    };
    build_runtime_with(provider, in_memory_backend(), &config, default_hooks()).await
}

/// Runtime described entirely by `config`, including the backend and Gemini client.
pub async fn build_runtime_from_config(config: &RuntimeConfig) -> Result<RuntimeBundle, RuntimeError> {
    let memory = create_memory_backend(config.memory.clone())?;
    let provider = build_provider_with_config(
        ProviderBuildConfig::new(ProviderId::Gemini).with_connect_timeout(config.connect_timeout()),
    )?;
    build_runtime_with(provider, memory, config, default_hooks()).await
}

pub async fn build_runtime_with(
    provider: Arc<dyn ProviderClient>,
    memory: Arc<dyn MemoryBackend>,
    config: &RuntimeConfig,
    hooks: Arc<dyn ExchangeHooks>,
) -> Result<RuntimeBundle, RuntimeError> {
    let candidates = config.model_candidates()?;
    let keys = Arc::new(
        load_key_pool(memory.as_ref(), config.key_pool, config.api_keys.iter()).await?,
    );
    let store = Arc::new(MemoryConversationStore::new(Arc::clone(&memory)));

    let driver = RequestDriver::builder()
        .provider(provider)
        .key_pool(Arc::clone(&keys))
        .store(store.clone())
        .owner_store(store)
        .hooks(hooks)
        .config(config.driver.clone())
        .safety(config.safety)
        .build()?;
    let editor = driver.editor();

    Ok(RuntimeBundle {
        memory,
        keys,
        driver,
        editor,
        candidates,
    })
}
