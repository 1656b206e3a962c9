//! Small convenience constructors for common types.

use crate::{ConversationId, ExchangeRequest, ModelCandidate, ProviderId, Role, Turn};

pub fn user_turn(text: impl Into<String>) -> Turn {
    Turn::user(text)
}

pub fn model_turn(text: impl Into<String>) -> Turn {
    Turn::new(Role::Model, vec![crate::Part::text(text)])
}

/// Gemini candidates in the given fallback order.
pub fn gemini_candidates<I, S>(models: I) -> Vec<ModelCandidate>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    models.into_iter().map(ModelCandidate::gemini).collect()
}

pub fn exchange(
    conversation_id: impl Into<ConversationId>,
    query: impl Into<String>,
    candidates: Vec<ModelCandidate>,
) -> ExchangeRequest {
    ExchangeRequest::new(conversation_id, query).with_candidates(candidates)
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" | "google-ai" | "google_ai" => Some(ProviderId::Gemini),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::{ProviderId, Role};

    use super::{exchange, gemini_candidates, model_turn, parse_provider_id, user_turn};

    #[test]
    fn parse_provider_id_supports_aliases() {
        assert_eq!(parse_provider_id("gemini"), Some(ProviderId::Gemini));
        assert_eq!(parse_provider_id(" Google "), Some(ProviderId::Gemini));
        assert_eq!(parse_provider_id("unknown"), None);
    }

    #[test]
    fn turn_and_request_helpers_apply_expected_defaults() {
        assert_eq!(user_turn("hello").role, Role::User);
        assert!(model_turn("hi").is_model_answer());

        let request = exchange(
            "chat-1",
            "hello",
            gemini_candidates(["gemini-2.5-flash", "gemini-2.5-pro"]),
        );
        assert_eq!(request.candidates.len(), 2);
        assert_eq!(request.candidates[1].model, "gemini-2.5-pro");
        assert!(!request.stateless);
    }
}
