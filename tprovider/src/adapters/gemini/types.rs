//! Gemini request/response values decoupled from the JSON wire shape.

use std::time::Duration;

use crate::{
    Credential, FinishReason, Part, ProviderId, ProviderResponse, SafetyPolicy, ToolDeclaration,
    Turn,
};

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiRequest {
    pub model: String,
    /// Full turn log including the new user turn as its last entry.
    pub contents: Vec<Turn>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub tools: Vec<ToolDeclaration>,
    pub safety: SafetyPolicy,
    pub api_key: Credential,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiFinishReason {
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Blocklist,
    ProhibitedContent,
    MalformedFunctionCall,
    Other,
}

impl GeminiFinishReason {
    pub fn is_blocked(self) -> bool {
        matches!(self, Self::Safety | Self::Blocklist | Self::ProhibitedContent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiOutput {
    pub model: String,
    pub parts: Vec<Part>,
    pub finish_reason: GeminiFinishReason,
    pub block_reason: Option<String>,
}

impl GeminiOutput {
    pub fn into_provider_response(self) -> ProviderResponse {
        let has_call = self.parts.iter().any(Part::is_function_call);
        let finish_reason = match self.finish_reason {
            GeminiFinishReason::Stop if has_call => FinishReason::ToolUse,
            GeminiFinishReason::Stop => FinishReason::Stop,
            GeminiFinishReason::MaxTokens => FinishReason::MaxTokens,
            GeminiFinishReason::Safety
            | GeminiFinishReason::Blocklist
            | GeminiFinishReason::ProhibitedContent => FinishReason::Safety,
            GeminiFinishReason::Recitation
            | GeminiFinishReason::MalformedFunctionCall
            | GeminiFinishReason::Other => FinishReason::Other,
        };

        ProviderResponse {
            provider: ProviderId::Gemini,
            model: self.model,
            parts: self.parts,
            finish_reason,
        }
    }
}
