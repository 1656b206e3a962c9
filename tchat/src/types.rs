//! Exchange request and reply types.

use std::time::Duration;

use tcommon::{ConversationId, Deadline};
use tprovider::{Credential, MediaPart, ModelCandidate, Part, Role, ToolDeclaration, Turn};

pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(120);

/// One chat turn to execute against the candidate models.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    pub conversation_id: ConversationId,
    pub query: String,
    pub media: Vec<MediaPart>,
    /// Tried in order; each gets its own attempt budget.
    pub candidates: Vec<ModelCandidate>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub deadline: Deadline,
    /// Used for every attempt instead of drawing from the key pool.
    pub credential: Option<Credential>,
    pub tools: Vec<ToolDeclaration>,
    /// Neither reads nor writes stored history.
    pub stateless: bool,
}

impl ExchangeRequest {
    pub fn new(conversation_id: impl Into<ConversationId>, query: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            query: query.into(),
            media: Vec::new(),
            candidates: Vec::new(),
            system_instruction: None,
            temperature: None,
            max_tokens: None,
            deadline: Deadline::after(DEFAULT_EXCHANGE_TIMEOUT),
            credential: None,
            tools: Vec::new(),
            stateless: false,
        }
    }

    pub fn with_candidate(mut self, candidate: ModelCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<ModelCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_media(mut self, data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        self.media.push(MediaPart {
            data: data.into(),
            mime_type: mime_type.into(),
        });
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Deadline::after(timeout);
        self
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    pub fn stateless(mut self) -> Self {
        self.stateless = true;
        self
    }

    /// The user turn for this query, text cut to `max_chars` characters.
    pub(crate) fn query_turn(&self, max_chars: usize) -> Turn {
        let text = self.query.chars().take(max_chars).collect::<String>();
        let mut parts = vec![Part::Text(text)];
        parts.extend(self.media.iter().cloned().map(Part::Media));
        Turn::new(Role::User, parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExchangeReply {
    pub text: String,
    pub media: Vec<MediaPart>,
}

impl ExchangeReply {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.media.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_turn_truncates_text_and_appends_media() {
        let request = ExchangeRequest::new("chat-1", "héllo world").with_media(vec![1, 2], "image/png");

        let turn = request.query_turn(5);

        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.parts[0], Part::text("héllo"));
        assert!(turn.has_media());
    }

    #[test]
    fn builder_helpers_set_fields() {
        let request = ExchangeRequest::new("chat-1", "q")
            .with_candidate(ModelCandidate::gemini("gemini-2.5-flash"))
            .with_temperature(0.4)
            .with_max_tokens(200)
            .with_system_instruction("be kind")
            .with_credential(Credential::new("key-1234"))
            .stateless();

        assert_eq!(request.candidates.len(), 1);
        assert_eq!(request.temperature, Some(0.4));
        assert_eq!(request.max_tokens, Some(200));
        assert!(request.stateless);
        assert!(request.credential.is_some());
        assert!(!request.deadline.is_expired());
        assert!(ExchangeReply::empty().is_empty());
    }
}
