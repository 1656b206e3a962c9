//! Gemini provider implementation over transport and shared models.

use std::sync::Arc;

use crate::{
    ProviderCall, ProviderClient, ProviderError, ProviderFuture, ProviderId, ProviderResponse,
};

use super::transport::{GeminiHttpTransport, GeminiTransport};
use super::types::{GeminiOutput, GeminiRequest};

#[derive(Clone)]
pub struct GeminiClient {
    transport: Arc<dyn GeminiTransport>,
}

impl GeminiClient {
    pub fn new(transport: Arc<dyn GeminiTransport>) -> Self {
        Self { transport }
    }

    pub fn http(client: reqwest::Client) -> Self {
        Self::new(Arc::new(GeminiHttpTransport::new(client)))
    }

    pub(crate) fn build_gemini_request(&self, call: ProviderCall) -> GeminiRequest {
        let mut contents = call.history;
        contents.push(call.turn);

        GeminiRequest {
            model: call.model,
            contents,
            system_instruction: call.config.system_instruction,
            temperature: call.config.options.temperature,
            max_output_tokens: call.config.options.max_tokens,
            tools: call.config.tools,
            safety: call.config.safety,
            api_key: call.credential,
            timeout: call.timeout,
        }
    }

    pub(crate) fn finish(output: GeminiOutput) -> Result<ProviderResponse, ProviderError> {
        if let Some(reason) = output.block_reason.as_deref() {
            return Err(ProviderError::content_blocked(format!(
                "prompt blocked by Gemini: {reason}"
            )));
        }

        if output.finish_reason.is_blocked() {
            return Err(ProviderError::content_blocked(format!(
                "response stopped by Gemini: {:?}",
                output.finish_reason
            )));
        }

        Ok(output.into_provider_response())
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("transport", &self.transport)
            .finish()
    }
}

impl ProviderClient for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn send<'a>(
        &'a self,
        call: ProviderCall,
    ) -> ProviderFuture<'a, Result<ProviderResponse, ProviderError>> {
        Box::pin(async move {
            call.validate()?;
            let request = self.build_gemini_request(call);
            let output = self.transport.generate(request).await?;
            Self::finish(output)
        })
    }
}
