//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use tcommon::{ConversationId, Deadline, GenerationOptions};
//!
//! let conversation = ConversationId::from("chat-1");
//! let deadline = Deadline::after(Duration::from_secs(30));
//! let options = GenerationOptions::default().with_temperature(0.3).with_max_tokens(512);
//!
//! assert_eq!(conversation.as_str(), "chat-1");
//! assert!(!deadline.is_expired());
//! assert_eq!(options.max_tokens, Some(512));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use tcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use tcommon::ConversationId;
    //!
    //! let conversation = ConversationId::new("[9123456789] [0]");
    //! assert_eq!(conversation.to_string(), "[9123456789] [0]");
    //! ```

    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ConversationId(String);

    impl ConversationId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for ConversationId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for ConversationId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for ConversationId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    impl From<&ConversationId> for ConversationId {
        fn from(value: &ConversationId) -> Self {
            value.clone()
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use tcommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128);
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(128));
    //! ```

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }
    }
}

pub mod time {
    //! Absolute deadlines shared by every step of one exchange.
    //!
    //! ```rust
    //! use std::time::Duration;
    //!
    //! use tcommon::Deadline;
    //!
    //! let expired = Deadline::after(Duration::ZERO);
    //! assert!(expired.is_expired());
    //! assert_eq!(expired.remaining(), Duration::ZERO);
    //! ```

    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Deadline(Instant);

    impl Deadline {
        pub fn at(instant: Instant) -> Self {
            Self(instant)
        }

        pub fn after(duration: Duration) -> Self {
            Self(Instant::now() + duration)
        }

        pub fn instant(&self) -> Instant {
            self.0
        }

        /// Time left before the deadline, saturating at zero.
        pub fn remaining(&self) -> Duration {
            self.0.saturating_duration_since(Instant::now())
        }

        pub fn is_expired(&self) -> bool {
            self.remaining().is_zero()
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use tcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert_eq!(*registry.get_or_insert_with("beta".to_string(), || 2), 2);
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
            self.items.entry(key).or_insert_with(make)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::ConversationId;
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;
pub use time::Deadline;

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{ConversationId, Deadline, GenerationOptions, Registry};

    #[test]
    fn conversation_id_round_trips_strings() {
        let id = ConversationId::new("chat-1");
        let from_str = ConversationId::from("chat-1");

        assert_eq!(id, from_str);
        assert_eq!(id.as_str(), "chat-1");
        assert_eq!(id.to_string(), "chat-1");
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123);

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
    }

    #[test]
    fn deadline_reports_remaining_time_and_expiry() {
        let future = Deadline::after(Duration::from_secs(60));
        assert!(!future.is_expired());
        assert!(future.remaining() > Duration::from_secs(59));

        let past = Deadline::at(Instant::now() - Duration::from_millis(1));
        assert!(past.is_expired());
        assert_eq!(past.remaining(), Duration::ZERO);
    }

    #[test]
    fn generic_registry_basic_lifecycle() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("alpha".to_string(), 1_u32);
        assert_eq!(registry.get("alpha"), Some(&1));
        assert!(registry.contains_key("alpha"));

        *registry.get_or_insert_with("alpha".to_string(), || 99) += 1;
        assert_eq!(registry.get("alpha"), Some(&2));
        assert_eq!(registry.len(), 1);

        let removed = registry.remove("alpha");
        assert_eq!(removed, Some(2));
        assert!(registry.is_empty());
    }
}
