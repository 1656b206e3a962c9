//! Provider-agnostic turn, part, call and response model types.
//!
//! ```rust
//! use tprovider::{Part, Role, Turn};
//!
//! let question = Turn::user("What is on this picture?")
//!     .with_part(Part::media(vec![0x89, 0x50, 0x4e, 0x47], "image/png"));
//!
//! assert_eq!(question.role, Role::User);
//! assert!(question.has_media());
//! assert!(question.is_user_plain());
//! assert_eq!(question.text_chars(), 24);
//! ```

use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcommon::GenerationOptions;

use crate::{Credential, ProviderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Gemini,
    Custom(&'static str),
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// One entry in an ordered model fallback list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelCandidate {
    pub provider: ProviderId,
    pub model: String,
}

impl ModelCandidate {
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn gemini(model: impl Into<String>) -> Self {
        Self::new(ProviderId::Gemini, model)
    }

    pub fn is_blank(&self) -> bool {
        self.model.trim().is_empty()
    }
}

impl Display for ModelCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

impl FunctionResponse {
    pub fn new(name: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            response,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl std::fmt::Debug for MediaPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPart")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Media(MediaPart),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn media(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self::Media(MediaPart {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self::FunctionCall(FunctionCall::new(name, args))
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self::FunctionResponse(FunctionResponse::new(name, response))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Self::Media(_))
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Self::FunctionCall(_))
    }

    pub fn is_function_response(&self) -> bool {
        matches!(self, Self::FunctionResponse(_))
    }

    /// Character count contributed to history size budgets; only text counts.
    pub fn text_chars(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Media(_) | Self::FunctionCall(_) | Self::FunctionResponse(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_model(&self) -> bool {
        self.role == Role::Model
    }

    pub fn has_media(&self) -> bool {
        self.parts.iter().any(Part::is_media)
    }

    /// A model turn carrying at least one function call awaiting a response.
    pub fn opens_call(&self) -> bool {
        self.is_model() && self.parts.iter().any(Part::is_function_call)
    }

    /// A user turn made up entirely of function responses.
    pub fn is_function_response(&self) -> bool {
        self.is_user()
            && !self.parts.is_empty()
            && self.parts.iter().all(Part::is_function_response)
    }

    pub fn is_user_plain(&self) -> bool {
        self.is_user() && !self.is_function_response()
    }

    pub fn is_model_answer(&self) -> bool {
        self.is_model() && !self.opens_call()
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn text_chars(&self) -> usize {
        self.parts.iter().map(Part::text_chars).sum()
    }
}

pub type History = Vec<Turn>;

pub fn history_text_chars(history: &[Turn]) -> usize {
    history.iter().map(Turn::text_chars).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPolicy {
    ProviderDefault,
    #[default]
    BlockNone,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SendConfig {
    pub system_instruction: Option<String>,
    pub options: GenerationOptions,
    pub tools: Vec<ToolDeclaration>,
    pub safety: SafetyPolicy,
}

impl SendConfig {
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_safety(mut self, safety: SafetyPolicy) -> Self {
        self.safety = safety;
        self
    }
}

/// One outbound provider request: prior history plus the new user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCall {
    pub model: String,
    pub history: Vec<Turn>,
    pub turn: Turn,
    pub config: SendConfig,
    pub timeout: Duration,
    pub credential: Credential,
}

impl ProviderCall {
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if !self.turn.is_user() || self.turn.parts.is_empty() {
            return Err(ProviderError::invalid_request(
                "the new turn must be a non-empty user turn",
            ));
        }

        if let Some(max_tokens) = self.config.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.config.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if self.timeout.is_zero() {
            return Err(ProviderError::timeout("no time left for the provider call"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    ToolUse,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub provider: ProviderId,
    pub model: String,
    pub parts: Vec<Part>,
    pub finish_reason: FinishReason,
}

impl ProviderResponse {
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<String>()
    }

    pub fn media(&self) -> Vec<MediaPart> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Media(media) => Some(media.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_content(&self) -> bool {
        !self.text().trim().is_empty() || self.parts.iter().any(Part::is_media)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::ProviderErrorKind;

    fn call(turn: Turn) -> ProviderCall {
        ProviderCall {
            model: "gemini-2.5-flash".to_string(),
            history: Vec::new(),
            turn,
            config: SendConfig::default(),
            timeout: Duration::from_secs(10),
            credential: Credential::new("key-0001"),
        }
    }

    #[test]
    fn provider_id_display_is_stable() {
        assert_eq!(ProviderId::Gemini.to_string(), "gemini");
        assert_eq!(ProviderId::Custom("mock").to_string(), "mock");
        assert_eq!(
            ModelCandidate::gemini("gemini-2.5-flash").to_string(),
            "gemini/gemini-2.5-flash"
        );
        assert!(ModelCandidate::gemini("  ").is_blank());
    }

    #[test]
    fn turn_classification_distinguishes_calls_and_responses() {
        let call_turn = Turn::new(
            Role::Model,
            vec![Part::function_call("calc", json!({"expr": "1+1"}))],
        );
        let response_turn = Turn::new(
            Role::User,
            vec![Part::function_response("calc", json!({"result": 2}))],
        );

        assert!(call_turn.opens_call());
        assert!(!call_turn.is_model_answer());
        assert!(response_turn.is_function_response());
        assert!(!response_turn.is_user_plain());
        assert!(Turn::user("hi").is_user_plain());
        assert!(Turn::model("hello").is_model_answer());
        assert!(Turn::new(Role::User, Vec::new()).is_user_plain());
    }

    #[test]
    fn text_chars_ignore_media_and_calls() {
        let turn = Turn::user("héllo")
            .with_part(Part::media(vec![1, 2, 3], "image/jpeg"))
            .with_part(Part::function_response("x", json!("ignored")));

        assert_eq!(turn.text_chars(), 5);
        assert_eq!(history_text_chars(&[turn, Turn::model("ok")]), 7);
    }

    #[test]
    fn provider_call_validate_enforces_contract() {
        assert!(call(Turn::user("hi")).validate().is_ok());

        let mut blank_model = call(Turn::user("hi"));
        blank_model.model = "  ".to_string();
        let error = blank_model.validate().expect_err("blank model must fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);

        let error = call(Turn::model("not a question"))
            .validate()
            .expect_err("model turn must fail");
        assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);

        let mut hot = call(Turn::user("hi"));
        hot.config = hot.config.with_temperature(2.5);
        assert!(hot.validate().is_err());

        let mut expired = call(Turn::user("hi"));
        expired.timeout = Duration::ZERO;
        let error = expired.validate().expect_err("zero timeout must fail");
        assert_eq!(error.kind, ProviderErrorKind::Timeout);
    }

    #[test]
    fn response_content_detection_covers_text_and_media() {
        let empty = ProviderResponse {
            provider: ProviderId::Gemini,
            model: "m".to_string(),
            parts: vec![Part::text("   ")],
            finish_reason: FinishReason::Stop,
        };
        assert!(!empty.has_content());

        let image_only = ProviderResponse {
            parts: vec![Part::media(vec![9], "image/png")],
            ..empty.clone()
        };
        assert!(image_only.has_content());
        assert_eq!(image_only.media().len(), 1);
        assert_eq!(image_only.text(), "");
    }
}
