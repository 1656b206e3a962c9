//! Point-in-time edits of stored conversation history.

use std::sync::Arc;

use tcommon::ConversationId;
use tprovider::{Part, Role, Turn};

use crate::history::last_group_start;
use crate::{ChatError, ConversationStore, LockRegistry};

/// Reset, undo and force operations, each under the conversation's lock.
#[derive(Clone)]
pub struct HistoryEditor {
    store: Arc<dyn ConversationStore>,
    locks: Arc<LockRegistry>,
}

impl HistoryEditor {
    pub fn new(store: Arc<dyn ConversationStore>, locks: Arc<LockRegistry>) -> Self {
        Self { store, locks }
    }

    pub async fn reset(&self, conversation_id: &ConversationId) -> Result<(), ChatError> {
        let _guard = self.locks.lock(conversation_id).await?;
        self.store.save_history(conversation_id, Vec::new()).await
    }

    /// Drops the newest logical group.
    pub async fn undo(&self, conversation_id: &ConversationId) -> Result<(), ChatError> {
        let _guard = self.locks.lock(conversation_id).await?;
        let mut history = self.store.load_history(conversation_id).await?;
        if history.is_empty() {
            return Ok(());
        }

        match last_group_start(&history) {
            Some(start) => history.truncate(start),
            None => history.clear(),
        }

        self.store.save_history(conversation_id, history).await
    }

    /// Replaces the terminal answer of the newest exchange with `text`.
    ///
    /// Call/response turns before that answer are kept; anything stored after it
    /// is dropped. An unanswered exchange gets `text` appended as its answer.
    pub async fn force(
        &self,
        conversation_id: &ConversationId,
        text: impl Into<String>,
    ) -> Result<(), ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::invalid_request("forced answer must not be empty"));
        }

        let _guard = self.locks.lock(conversation_id).await?;
        let mut history = self.store.load_history(conversation_id).await?;
        if history.is_empty() {
            return Ok(());
        }

        let start = history
            .iter()
            .rposition(Turn::is_user_plain)
            .unwrap_or_default();
        match history[start..].iter().rposition(Turn::is_model_answer) {
            Some(offset) => history.truncate(start + offset),
            None => {
                while history.len() > start + 1 && history.last().is_some_and(Turn::is_model) {
                    history.pop();
                }
            }
        }
        history.push(Turn::model(text));

        self.store.save_history(conversation_id, history).await
    }

    /// Human-readable transcript with one `USER:`/`BOT:` block per turn.
    pub async fn dump_history(&self, conversation_id: &ConversationId) -> Result<String, ChatError> {
        let history = self.store.load_history(conversation_id).await?;
        Ok(render_transcript(&history))
    }
}

pub fn render_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "USER",
                Role::Model => "BOT",
            };
            let body = turn
                .parts
                .iter()
                .map(render_part)
                .collect::<Vec<_>>()
                .join("\n");
            format!("{speaker}: {body}")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_part(part: &Part) -> String {
    match part {
        Part::Text(text) => text.clone(),
        Part::Media(media) => format!("[media {}, {} bytes]", media.mime_type, media.data.len()),
        Part::FunctionCall(call) => format!("[call {}({})]", call.name, call.args),
        Part::FunctionResponse(response) => {
            format!("[result {}: {}]", response.name, response.response)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::InMemoryConversationStore;

    async fn editor_with(history: Vec<Turn>) -> (HistoryEditor, Arc<InMemoryConversationStore>, ConversationId) {
        let store = Arc::new(InMemoryConversationStore::new());
        let id = ConversationId::from("chat-1");
        store
            .save_history(&id, history)
            .await
            .expect("seed history should save");
        let editor = HistoryEditor::new(store.clone(), Arc::new(LockRegistry::new()));
        (editor, store, id)
    }

    #[tokio::test]
    async fn force_replaces_the_newest_answer() {
        let (editor, store, id) = editor_with(vec![
            Turn::user("q1"),
            Turn::model("a1"),
            Turn::user("q2"),
            Turn::model("a2"),
        ])
        .await;

        editor.force(&id, "new").await.expect("force should succeed");

        assert_eq!(
            store.load_history(&id).await.expect("load"),
            vec![
                Turn::user("q1"),
                Turn::model("a1"),
                Turn::user("q2"),
                Turn::model("new"),
            ]
        );
    }

    fn call(name: &str) -> Turn {
        Turn::new(Role::Model, vec![Part::function_call(name, json!({}))])
    }

    fn response(name: &str) -> Turn {
        Turn::new(Role::User, vec![Part::function_response(name, json!(1))])
    }

    #[tokio::test]
    async fn force_keeps_tool_exchange_before_the_answer() {
        let (editor, store, id) = editor_with(vec![
            Turn::user("q1"),
            call("f"),
            response("f"),
            Turn::model("a1"),
        ])
        .await;

        editor.force(&id, "forced").await.expect("force should succeed");

        assert_eq!(
            store.load_history(&id).await.expect("load"),
            vec![Turn::user("q1"), call("f"), response("f"), Turn::model("forced")]
        );
    }

    #[tokio::test]
    async fn force_drops_tool_exchange_stored_after_the_answer() {
        let (editor, store, id) = editor_with(vec![
            Turn::user("q1"),
            Turn::model("a1"),
            call("f"),
            response("f"),
        ])
        .await;

        editor.force(&id, "new").await.expect("force should succeed");

        assert_eq!(
            store.load_history(&id).await.expect("load"),
            vec![Turn::user("q1"), Turn::model("new")]
        );
    }

    #[tokio::test]
    async fn force_answers_an_unanswered_exchange() {
        let cases = vec![
            (
                vec![Turn::user("q1"), Turn::model("a1"), Turn::user("q2")],
                vec![Turn::user("q1"), Turn::model("a1"), Turn::user("q2"), Turn::model("x")],
            ),
            (
                vec![Turn::user("q1"), call("f"), response("f")],
                vec![Turn::user("q1"), call("f"), response("f"), Turn::model("x")],
            ),
            (
                vec![Turn::user("q1"), call("f")],
                vec![Turn::user("q1"), Turn::model("x")],
            ),
        ];

        for (history, expected) in cases {
            let (editor, store, id) = editor_with(history).await;

            editor.force(&id, "x").await.expect("force should succeed");

            let forced = store.load_history(&id).await.expect("load");
            assert_eq!(forced, expected);
            assert!(forced.windows(2).all(|pair| pair[0].role != pair[1].role));
        }
    }

    #[tokio::test]
    async fn force_on_empty_history_is_a_no_op() {
        let (editor, store, id) = editor_with(Vec::new()).await;

        editor.force(&id, "x").await.expect("force should succeed");
        assert!(store.load_history(&id).await.expect("load").is_empty());

        let error = editor.force(&id, "  ").await.expect_err("blank text must fail");
        assert_eq!(error.kind, crate::ChatErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn undo_drops_the_newest_group_and_reset_clears() {
        let (editor, store, id) = editor_with(vec![
            Turn::user("q1"),
            Turn::model("a1"),
            Turn::user("q2"),
            Turn::model("a2"),
        ])
        .await;

        editor.undo(&id).await.expect("undo should succeed");
        assert_eq!(
            store.load_history(&id).await.expect("load"),
            vec![Turn::user("q1"), Turn::model("a1")]
        );

        editor.undo(&id).await.expect("undo should succeed");
        assert!(store.load_history(&id).await.expect("load").is_empty());

        store
            .save_history(&id, vec![Turn::user("q"), Turn::model("a")])
            .await
            .expect("save");
        editor.reset(&id).await.expect("reset should succeed");
        assert!(store.load_history(&id).await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn dump_history_renders_every_part_kind() {
        let (editor, _store, id) = editor_with(vec![
            Turn::user("look").with_part(Part::media(vec![0; 3], "image/png")),
            Turn::new(
                Role::Model,
                vec![Part::function_call("describe", json!({"detail": "high"}))],
            ),
            Turn::new(
                Role::User,
                vec![Part::function_response("describe", json!("a cat"))],
            ),
            Turn::model("A cat."),
        ])
        .await;

        let transcript = editor.dump_history(&id).await.expect("dump should succeed");

        assert_eq!(
            transcript,
            "USER: look\n[media image/png, 3 bytes]\n\n\
             BOT: [call describe({\"detail\":\"high\"})]\n\n\
             USER: [result describe: \"a cat\"]\n\n\
             BOT: A cat."
        );
    }
}
