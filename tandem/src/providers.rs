//! Stable provider construction surface for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use crate::{ProviderClient, ProviderError, ProviderId};

#[derive(Debug, Clone)]
pub struct ProviderBuildConfig {
    pub provider_id: ProviderId,
    pub connect_timeout: Duration,
    /// Overrides the provider's public endpoint, e.g. for a proxy.
    pub base_url: Option<String>,
}

impl ProviderBuildConfig {
    pub fn new(provider_id: ProviderId) -> Self {
        Self {
            provider_id,
            connect_timeout: Duration::from_secs(10),
            base_url: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

pub fn build_provider(provider_id: ProviderId) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    build_provider_with_config(ProviderBuildConfig::new(provider_id))
}

pub fn build_provider_with_config(
    config: ProviderBuildConfig,
) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    match config.provider_id {
        ProviderId::Gemini => build_gemini_provider(&config),
        ProviderId::Custom(name) => Err(ProviderError::invalid_request(format!(
            "provider '{name}' has no built-in client; register it on the driver builder"
        ))),
    }
}

#[cfg(feature = "provider-gemini")]
fn build_gemini_provider(
    config: &ProviderBuildConfig,
) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    use tprovider::{GeminiClient, GeminiHttpTransport};

    let http = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    let mut transport = GeminiHttpTransport::new(http);
    if let Some(base_url) = &config.base_url {
        transport = transport.with_base_url(base_url.clone());
    }

    Ok(Arc::new(GeminiClient::new(Arc::new(transport))))
}

#[cfg(not(feature = "provider-gemini"))]
fn build_gemini_provider(
    _config: &ProviderBuildConfig,
) -> Result<Arc<dyn ProviderClient>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider 'gemini' is disabled; enable feature 'provider-gemini'",
    ))
}

#[cfg(test)]
mod tests {
    use crate::{ProviderErrorKind, ProviderId};

    use super::{ProviderBuildConfig, build_provider_with_config};

    #[test]
    fn custom_providers_are_not_built_in() {
        let error = build_provider_with_config(ProviderBuildConfig::new(ProviderId::Custom(
            "local",
        )))
        .err()
        .expect("custom provider must be rejected");

        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
    }

    #[cfg(feature = "provider-gemini")]
    #[test]
    fn gemini_provider_builds_with_custom_endpoint() {
        let provider = build_provider_with_config(
            ProviderBuildConfig::new(ProviderId::Gemini).with_base_url("http://127.0.0.1:9/v1beta"),
        )
        .expect("gemini provider should build");

        assert_eq!(provider.id(), ProviderId::Gemini);
    }
}
