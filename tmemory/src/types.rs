//! Serialized forms of stored turns and credential owners.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcommon::ConversationId;
use tprovider::{Part, Role, Turn};

use crate::error::MemoryError;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTurn {
    pub role: String,
    pub parts: Vec<PersistedPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PersistedPart {
    Text { text: String },
    Media { mime_type: String, data: String },
    FunctionCall { name: String, args: Value },
    FunctionResponse { name: String, response: Value },
}

impl PersistedTurn {
    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            parts: turn.parts.iter().map(PersistedPart::from_part).collect(),
        }
    }

    pub fn into_turn(self) -> Result<Turn, MemoryError> {
        let role = role_from_str(&self.role)?;
        let parts = self
            .parts
            .into_iter()
            .map(PersistedPart::into_part)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Turn::new(role, parts))
    }
}

impl PersistedPart {
    fn from_part(part: &Part) -> Self {
        match part {
            Part::Text(text) => Self::Text { text: text.clone() },
            Part::Media(media) => Self::Media {
                mime_type: media.mime_type.clone(),
                data: STANDARD.encode(&media.data),
            },
            Part::FunctionCall(call) => Self::FunctionCall {
                name: call.name.clone(),
                args: call.args.clone(),
            },
            Part::FunctionResponse(response) => Self::FunctionResponse {
                name: response.name.clone(),
                response: response.response.clone(),
            },
        }
    }

    fn into_part(self) -> Result<Part, MemoryError> {
        Ok(match self {
            Self::Text { text } => Part::Text(text),
            Self::Media { mime_type, data } => {
                let bytes = STANDARD.decode(data.as_bytes()).map_err(|error| {
                    MemoryError::corrupt(format!("invalid stored media payload: {error}"))
                })?;
                Part::media(bytes, mime_type)
            }
            Self::FunctionCall { name, args } => Part::function_call(name, args),
            Self::FunctionResponse { name, response } => Part::function_response(name, response),
        })
    }
}

/// One conversation's stored history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub schema_version: u32,
    pub conversation_id: ConversationId,
    pub turns: Vec<PersistedTurn>,
}

impl ConversationRecord {
    pub fn new(conversation_id: ConversationId, history: &[Turn]) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            conversation_id,
            turns: history.iter().map(PersistedTurn::from_turn).collect(),
        }
    }

    pub fn into_history(self) -> Result<Vec<Turn>, MemoryError> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(MemoryError::corrupt(format!(
                "conversation '{}' uses unsupported schema version {}",
                self.conversation_id, self.schema_version
            )));
        }

        self.turns.into_iter().map(PersistedTurn::into_turn).collect()
    }
}

/// Credentials registered by one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub owner: String,
    pub secrets: Vec<String>,
}

pub(crate) fn encode_turns(history: &[Turn]) -> Result<String, MemoryError> {
    let turns = history.iter().map(PersistedTurn::from_turn).collect::<Vec<_>>();
    serde_json::to_string(&turns)
        .map_err(|error| MemoryError::storage(format!("failed to serialize history: {error}")))
}

pub(crate) fn decode_turns(json: &str) -> Result<Vec<Turn>, MemoryError> {
    let turns = serde_json::from_str::<Vec<PersistedTurn>>(json)
        .map_err(|error| MemoryError::corrupt(format!("failed to deserialize history: {error}")))?;
    turns.into_iter().map(PersistedTurn::into_turn).collect()
}

fn role_from_str(value: &str) -> Result<Role, MemoryError> {
    match value {
        "user" => Ok(Role::User),
        "model" => Ok(Role::Model),
        _ => Err(MemoryError::corrupt(format!(
            "unknown stored turn role '{value}'"
        ))),
    }
}
