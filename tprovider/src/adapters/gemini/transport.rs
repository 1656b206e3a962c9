//! Gemini transport trait and reqwest-based HTTP implementation.

use reqwest::{Client, Response};

use crate::{ErrorClassifier, ProviderError, ProviderFuture, RawFault};

use super::classify::GeminiErrorClassifier;
use super::serde_api::{GeminiApiResponse, build_api_request};
use super::types::{GeminiOutput, GeminiRequest};

pub trait GeminiTransport: Send + Sync + std::fmt::Debug {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiOutput, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
    classifier: GeminiErrorClassifier,
}

impl GeminiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            classifier: GeminiErrorClassifier,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model.trim_start_matches("models/")
        )
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProviderError {
        let message = err.to_string();
        if err.is_timeout() {
            self.classifier
                .classify(&RawFault::new(&message).timed_out())
        } else {
            ProviderError::transport(message)
        }
    }

    async fn parse_error(&self, response: Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        self.classifier.classify_response(status, &body)
    }
}

impl GeminiTransport for GeminiHttpTransport {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
    ) -> ProviderFuture<'a, Result<GeminiOutput, ProviderError>> {
        Box::pin(async move {
            let api_request = build_api_request(&request)?;
            let response = self
                .client
                .post(self.endpoint(&request.model))
                .header("x-goog-api-key", request.api_key.expose())
                .timeout(request.timeout)
                .json(&api_request)
                .send()
                .await
                .map_err(|err| self.map_send_error(err))?;

            if !response.status().is_success() {
                return Err(self.parse_error(response).await);
            }

            let parsed: GeminiApiResponse = response
                .json()
                .await
                .map_err(|err| self.map_send_error(err))?;

            parsed.into_output(&request.model)
        })
    }
}
