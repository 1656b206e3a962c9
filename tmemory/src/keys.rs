//! Key pool bootstrap from static secrets plus stored owner registries.

use tprovider::{KeyPool, KeyPoolConfig};

use crate::backend::MemoryBackend;
use crate::error::MemoryError;

/// Builds a pool from `static_secrets`, then merges every stored owner's
/// credentials in owner order.
pub async fn load_key_pool<I, S>(
    backend: &dyn MemoryBackend,
    config: KeyPoolConfig,
    static_secrets: I,
) -> Result<KeyPool, MemoryError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pool = KeyPool::with_config(config, static_secrets);
    for (owner, secrets) in backend.load_owners().await? {
        pool.add_owner_credentials(owner, secrets)?;
    }
    Ok(pool)
}
