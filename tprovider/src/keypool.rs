//! Rotating provider credential pool with freeze, reclaim and removal.
//!
//! ```rust
//! use tprovider::{FreezeOutcome, KeyPool, KeyPoolConfig};
//!
//! let pool = KeyPool::with_config(KeyPoolConfig { reclaim_threshold: 1 }, ["key-aaaa", "key-bbbb"]);
//!
//! let first = pool.next().expect("pool lock").expect("credential");
//! assert_eq!(first.masked(), "…aaaa");
//!
//! assert_eq!(pool.freeze(&first).expect("pool lock"), FreezeOutcome::Frozen);
//! let second = pool.next().expect("pool lock").expect("credential");
//! assert_eq!(second.expose(), "key-bbbb");
//! ```

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// An API secret. `Debug` never prints the secret itself.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(secret: impl AsRef<str>) -> Self {
        Self(Arc::from(secret.as_ref().trim()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Log-safe form: an ellipsis followed by the last four characters.
    pub fn masked(&self) -> String {
        let chars = self.0.chars().collect::<Vec<_>>();
        let tail = chars[chars.len().saturating_sub(4)..]
            .iter()
            .collect::<String>();
        format!("…{tail}")
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"[REDACTED]").finish()
    }
}

fn default_reclaim_threshold() -> usize {
    20
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPoolConfig {
    /// When freezing would leave fewer usable credentials than this, every
    /// frozen credential is reclaimed instead.
    #[serde(default = "default_reclaim_threshold")]
    pub reclaim_threshold: usize,
}

impl Default for KeyPoolConfig {
    fn default() -> Self {
        Self {
            reclaim_threshold: default_reclaim_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeOutcome {
    Frozen,
    /// The pool was starved, so the whole frozen set was cleared.
    Reclaimed,
    /// The credential is not part of the pool.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyPoolStats {
    pub total: usize,
    pub usable: usize,
    pub frozen: usize,
    pub removed: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    master: Vec<Credential>,
    queue: VecDeque<Credential>,
    frozen: HashSet<Credential>,
    removed: HashSet<Credential>,
    owners: BTreeMap<String, Vec<Credential>>,
}

impl PoolState {
    fn is_usable(&self, credential: &Credential) -> bool {
        !self.frozen.contains(credential) && !self.removed.contains(credential)
    }

    fn usable_count(&self) -> usize {
        self.master
            .iter()
            .filter(|credential| self.is_usable(credential))
            .count()
    }

    fn admit(&mut self, credential: Credential) -> bool {
        if credential.is_empty()
            || self.removed.contains(&credential)
            || self.master.contains(&credential)
        {
            return false;
        }

        self.master.push(credential);
        true
    }
}

#[derive(Debug, Default)]
pub struct KeyPool {
    state: Mutex<PoolState>,
    config: KeyPoolConfig,
}

impl KeyPool {
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(KeyPoolConfig::default(), secrets)
    }

    pub fn with_config<I, S>(config: KeyPoolConfig, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = PoolState::default();
        for secret in secrets {
            state.admit(Credential::new(secret));
        }

        Self {
            state: Mutex::new(state),
            config,
        }
    }

    pub fn config(&self) -> KeyPoolConfig {
        self.config
    }

    /// Next credential in round-robin order, or `None` when nothing is usable.
    pub fn next(&self) -> Result<Option<Credential>, ProviderError> {
        let mut state = self.lock_state()?;

        loop {
            if state.queue.is_empty() {
                let rebuilt = state
                    .master
                    .iter()
                    .filter(|credential| state.is_usable(credential))
                    .cloned()
                    .collect::<VecDeque<_>>();

                if rebuilt.is_empty() {
                    return Ok(None);
                }

                state.queue = rebuilt;
            }

            match state.queue.pop_front() {
                Some(credential) if state.is_usable(&credential) => return Ok(Some(credential)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    pub fn freeze(&self, credential: &Credential) -> Result<FreezeOutcome, ProviderError> {
        let mut state = self.lock_state()?;

        if state.removed.contains(credential) || !state.master.contains(credential) {
            return Ok(FreezeOutcome::Ignored);
        }

        state.frozen.insert(credential.clone());

        if state.usable_count() < self.config.reclaim_threshold {
            state.frozen.clear();
            return Ok(FreezeOutcome::Reclaimed);
        }

        Ok(FreezeOutcome::Frozen)
    }

    /// Permanently drops `credential`, returning the owners whose registries changed.
    pub fn remove(&self, credential: &Credential) -> Result<Vec<String>, ProviderError> {
        let mut state = self.lock_state()?;

        state.master.retain(|candidate| candidate != credential);
        state.queue.retain(|candidate| candidate != credential);
        state.frozen.remove(credential);
        state.removed.insert(credential.clone());

        let mut affected = Vec::new();
        for (owner, credentials) in state.owners.iter_mut() {
            let before = credentials.len();
            credentials.retain(|candidate| candidate != credential);
            if credentials.len() != before {
                affected.push(owner.clone());
            }
        }

        Ok(affected)
    }

    /// Adds a single credential to the master list. Removed secrets stay out.
    pub fn add_credential(&self, secret: impl AsRef<str>) -> Result<bool, ProviderError> {
        Ok(self.lock_state()?.admit(Credential::new(secret)))
    }

    /// Merges an owner's credentials into the pool, returning how many were new to the pool.
    pub fn add_owner_credentials<I, S>(
        &self,
        owner: impl Into<String>,
        secrets: I,
    ) -> Result<usize, ProviderError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let owner = owner.into();
        let mut state = self.lock_state()?;
        let mut added = 0;

        for secret in secrets {
            let credential = Credential::new(secret);
            if credential.is_empty() || state.removed.contains(&credential) {
                continue;
            }

            let owned = state.owners.entry(owner.clone()).or_default();
            if !owned.contains(&credential) {
                owned.push(credential.clone());
            }

            if state.admit(credential) {
                added += 1;
            }
        }

        Ok(added)
    }

    pub fn owner_credentials(&self, owner: &str) -> Result<Vec<Credential>, ProviderError> {
        Ok(self
            .lock_state()?
            .owners
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    pub fn stats(&self) -> Result<KeyPoolStats, ProviderError> {
        let state = self.lock_state()?;
        Ok(KeyPoolStats {
            total: state.master.len(),
            usable: state.usable_count(),
            frozen: state.frozen.len(),
            removed: state.removed.len(),
        })
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, PoolState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::other("key pool lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("key-{index:04}")).collect()
    }

    #[test]
    fn credential_debug_and_mask_hide_secret() {
        let credential = Credential::new("AIzaSySecretValue1234");

        assert_eq!(credential.masked(), "…1234");
        assert_eq!(format!("{credential:?}"), "Credential(\"[REDACTED]\")");
        assert_eq!(Credential::new("ab").masked(), "…ab");
    }

    #[test]
    fn next_rotates_round_robin_and_rebuilds_queue() {
        let pool = KeyPool::new(["a-1111", "b-2222", "c-3333"]);
        let drawn = (0..6)
            .map(|_| {
                pool.next()
                    .expect("pool lock should succeed")
                    .expect("credential should be available")
                    .expose()
                    .to_string()
            })
            .collect::<Vec<_>>();

        assert_eq!(
            drawn,
            vec!["a-1111", "b-2222", "c-3333", "a-1111", "b-2222", "c-3333"]
        );
    }

    #[test]
    fn queued_entries_frozen_mid_rotation_are_skipped() {
        let pool = KeyPool::with_config(
            KeyPoolConfig {
                reclaim_threshold: 1,
            },
            ["a-1111", "b-2222", "c-3333"],
        );
        let first = pool.next().expect("lock").expect("credential");
        assert_eq!(first.expose(), "a-1111");

        pool.freeze(&Credential::new("b-2222")).expect("lock");
        let second = pool.next().expect("lock").expect("credential");
        assert_eq!(second.expose(), "c-3333");
    }

    #[test]
    fn empty_pool_reports_none() {
        let pool = KeyPool::new(Vec::<String>::new());
        assert_eq!(pool.next().expect("lock"), None);

        let single = KeyPool::new(["only-0001"]);
        let credential = single.next().expect("lock").expect("credential");
        single.remove(&credential).expect("lock");
        assert_eq!(single.next().expect("lock"), None);
    }

    #[test]
    fn freezing_below_threshold_reclaims_all_frozen_credentials() {
        let pool = KeyPool::with_config(
            KeyPoolConfig {
                reclaim_threshold: 20,
            },
            keys(25),
        );

        for index in 0..5 {
            let outcome = pool
                .freeze(&Credential::new(format!("key-{index:04}")))
                .expect("lock");
            assert_eq!(outcome, FreezeOutcome::Frozen);
        }
        assert_eq!(pool.stats().expect("lock").usable, 20);

        let outcome = pool.freeze(&Credential::new("key-0005")).expect("lock");
        assert_eq!(outcome, FreezeOutcome::Reclaimed);

        let stats = pool.stats().expect("lock");
        assert_eq!(stats.usable, 25);
        assert_eq!(stats.frozen, 0);
    }

    #[test]
    fn remove_is_permanent_and_reports_affected_owners() {
        let pool = KeyPool::new(["static-0001"]);
        pool.add_owner_credentials("alice", ["shared-0002", "alice-0003"])
            .expect("lock");
        pool.add_owner_credentials("bob", ["shared-0002"]).expect("lock");

        let owners = pool.remove(&Credential::new("shared-0002")).expect("lock");
        assert_eq!(owners, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(
            pool.owner_credentials("alice").expect("lock"),
            vec![Credential::new("alice-0003")]
        );
        assert!(pool.owner_credentials("bob").expect("lock").is_empty());

        let added = pool
            .add_owner_credentials("carol", ["shared-0002"])
            .expect("lock");
        assert_eq!(added, 0);
        assert!(!pool.add_credential("shared-0002").expect("lock"));

        let stats = pool.stats().expect("lock");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.removed, 1);
        assert_eq!(
            pool.freeze(&Credential::new("shared-0002")).expect("lock"),
            FreezeOutcome::Ignored
        );
    }

    #[test]
    fn owner_merge_deduplicates_against_master_list() {
        let pool = KeyPool::new(["k-0001"]);
        let added = pool
            .add_owner_credentials("alice", ["k-0001", "k-0002", "k-0002", "  "])
            .expect("lock");

        assert_eq!(added, 1);
        assert_eq!(pool.stats().expect("lock").total, 2);
        assert_eq!(pool.owner_credentials("alice").expect("lock").len(), 2);
    }

    #[test]
    fn config_deserializes_with_default_threshold() {
        let config: KeyPoolConfig = serde_json::from_str("{}").expect("config should parse");
        assert_eq!(config.reclaim_threshold, 20);
    }
}
