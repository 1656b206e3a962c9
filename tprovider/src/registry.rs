//! Provider registry for runtime client lookup by [`ProviderId`].
//!
//! ```rust
//! use tprovider::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! assert!(registry.is_empty());
//! assert_eq!(registry.len(), 0);
//! ```

use std::sync::Arc;

use tcommon::Registry;

use crate::{ProviderClient, ProviderId};

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Registry<ProviderId, Arc<dyn ProviderClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, provider: P)
    where
        P: ProviderClient + 'static,
    {
        self.providers.insert(provider.id(), Arc::new(provider));
    }

    pub fn register_shared(&mut self, provider: Arc<dyn ProviderClient>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, provider_id: ProviderId) -> Option<Arc<dyn ProviderClient>> {
        self.providers.get(&provider_id).cloned()
    }

    pub fn remove(&mut self, provider_id: ProviderId) -> Option<Arc<dyn ProviderClient>> {
        self.providers.remove(&provider_id)
    }

    pub fn contains(&self, provider_id: ProviderId) -> bool {
        self.providers.contains_key(&provider_id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        FinishReason, Part, ProviderCall, ProviderError, ProviderFuture, ProviderResponse,
    };

    struct EchoProvider;

    impl ProviderClient for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::Custom("echo")
        }

        fn send<'a>(
            &'a self,
            call: ProviderCall,
        ) -> ProviderFuture<'a, Result<ProviderResponse, ProviderError>> {
            Box::pin(async move {
                Ok(ProviderResponse {
                    provider: self.id(),
                    model: call.model,
                    parts: vec![Part::text(call.turn.text())],
                    finish_reason: FinishReason::Stop,
                })
            })
        }
    }

    #[test]
    fn registry_registers_and_removes_by_provider_id() {
        let mut registry = ProviderRegistry::new();
        registry.register(EchoProvider);

        assert!(registry.contains(ProviderId::Custom("echo")));
        assert!(!registry.contains(ProviderId::Gemini));
        assert_eq!(registry.len(), 1);

        let provider = registry
            .get(ProviderId::Custom("echo"))
            .expect("echo provider should be registered");
        assert_eq!(provider.id(), ProviderId::Custom("echo"));

        assert!(registry.remove(ProviderId::Custom("echo")).is_some());
        assert!(registry.is_empty());
    }
}
