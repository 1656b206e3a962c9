//! Gemini HTTP payload serde models and conversion helpers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{Part, ProviderError, SafetyPolicy, Turn};

use super::types::{GeminiFinishReason, GeminiOutput, GeminiRequest};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub(crate) fn build_api_request(request: &GeminiRequest) -> Result<GeminiApiRequest, ProviderError> {
    let contents = request
        .contents
        .iter()
        .map(GeminiApiContent::from_turn)
        .collect::<Vec<_>>();

    if contents.is_empty() {
        return Err(ProviderError::invalid_request(
            "Gemini request requires at least one content entry",
        ));
    }

    let system_instruction = request
        .system_instruction
        .as_deref()
        .map(str::trim)
        .filter(|instruction| !instruction.is_empty())
        .map(|instruction| GeminiApiContent {
            role: None,
            parts: vec![GeminiApiPart::text(instruction)],
        });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![GeminiApiTool {
            function_declarations: request
                .tools
                .iter()
                .map(|tool| GeminiApiFunctionDeclaration {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }]
    };

    let safety_settings = match request.safety {
        SafetyPolicy::ProviderDefault => Vec::new(),
        SafetyPolicy::BlockNone => HARM_CATEGORIES
            .iter()
            .map(|category| GeminiApiSafetySetting {
                category: (*category).to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect(),
    };

    let generation_config =
        if request.temperature.is_none() && request.max_output_tokens.is_none() {
            None
        } else {
            Some(GeminiApiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            })
        };

    Ok(GeminiApiRequest {
        contents,
        system_instruction,
        tools,
        safety_settings,
        generation_config,
    })
}

pub(crate) fn parse_finish_reason(value: Option<&str>) -> GeminiFinishReason {
    match value {
        Some("STOP") => GeminiFinishReason::Stop,
        Some("MAX_TOKENS") => GeminiFinishReason::MaxTokens,
        Some("SAFETY") => GeminiFinishReason::Safety,
        Some("RECITATION") => GeminiFinishReason::Recitation,
        Some("BLOCKLIST") => GeminiFinishReason::Blocklist,
        Some("PROHIBITED_CONTENT") | Some("SPII") => GeminiFinishReason::ProhibitedContent,
        Some("MALFORMED_FUNCTION_CALL") => GeminiFinishReason::MalformedFunctionCall,
        _ => GeminiFinishReason::Other,
    }
}

pub(crate) fn parse_error_envelope(body: &str) -> Option<GeminiApiError> {
    serde_json::from_str::<GeminiApiErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiRequest {
    pub contents: Vec<GeminiApiContent>,
    #[serde(rename = "system_instruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<GeminiApiTool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub safety_settings: Vec<GeminiApiSafetySetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GeminiApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiApiPart>,
}

impl GeminiApiContent {
    fn from_turn(turn: &Turn) -> Self {
        Self {
            role: Some(turn.role.as_str().to_string()),
            parts: turn.parts.iter().map(GeminiApiPart::from_part).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<GeminiApiBlob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GeminiApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<GeminiApiFunctionResponse>,
    #[serde(default, skip_serializing)]
    pub thought: Option<bool>,
}

impl GeminiApiPart {
    fn text(value: &str) -> Self {
        Self {
            text: Some(value.to_string()),
            ..Self::default()
        }
    }

    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text(text) => Self::text(text),
            Part::Media(media) => Self {
                inline_data: Some(GeminiApiBlob {
                    mime_type: media.mime_type.clone(),
                    data: STANDARD.encode(&media.data),
                }),
                ..Self::default()
            },
            Part::FunctionCall(call) => Self {
                function_call: Some(GeminiApiFunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Self::default()
            },
            Part::FunctionResponse(response) => Self {
                function_response: Some(GeminiApiFunctionResponse {
                    name: response.name.clone(),
                    response: response_object(&response.response),
                }),
                ..Self::default()
            },
        }
    }

    fn into_part(self) -> Result<Option<Part>, ProviderError> {
        if self.thought.unwrap_or(false) {
            return Ok(None);
        }

        if let Some(call) = self.function_call {
            return Ok(Some(Part::function_call(call.name, call.args)));
        }

        if let Some(response) = self.function_response {
            return Ok(Some(Part::function_response(response.name, response.response)));
        }

        if let Some(blob) = self.inline_data {
            let data = STANDARD
                .decode(blob.data.as_bytes())
                .map_err(|err| ProviderError::transport(format!("invalid inline data: {err}")))?;
            return Ok(Some(Part::media(data, blob.mime_type)));
        }

        Ok(self.text.map(Part::Text))
    }
}

/// Gemini requires `functionResponse.response` to be a JSON object.
fn response_object(value: &Value) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert("result".to_string(), other.clone());
            Value::Object(wrapped)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GeminiApiFunctionCall {
    pub name: String,
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    json!({})
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GeminiApiFunctionResponse {
    pub name: String,
    #[serde(default)]
    pub response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiTool {
    pub function_declarations: Vec<GeminiApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiFunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiApiSafetySetting {
    pub category: String,
    pub threshold: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiApiCandidate>,
    #[serde(default)]
    pub prompt_feedback: Option<GeminiApiPromptFeedback>,
    #[serde(default)]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiCandidate {
    #[serde(default)]
    pub content: Option<GeminiApiContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiPromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GeminiApiResponse {
    pub(crate) fn into_output(self, requested_model: &str) -> Result<GeminiOutput, ProviderError> {
        let block_reason = self
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        let model = self
            .model_version
            .unwrap_or_else(|| requested_model.to_string());

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Ok(GeminiOutput {
                model,
                parts: Vec::new(),
                finish_reason: GeminiFinishReason::Other,
                block_reason,
            });
        };

        let finish_reason = parse_finish_reason(candidate.finish_reason.as_deref());
        let mut parts = Vec::new();
        for part in candidate.content.map(|content| content.parts).unwrap_or_default() {
            if let Some(part) = part.into_part()? {
                parts.push(part);
            }
        }

        Ok(GeminiOutput {
            model,
            parts,
            finish_reason,
            block_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiErrorEnvelope {
    pub error: GeminiApiError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiApiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<GeminiApiErrorDetail>,
}

impl GeminiApiError {
    pub(crate) fn reason(&self) -> Option<&str> {
        self.details
            .iter()
            .find_map(|detail| detail.reason.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GeminiApiErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}
