//! Chat feed records and the remote chat call.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One element of an assistant reply: tool traces followed by the final text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantItem {
    /// Text produced by the assistant.
    OutputText { text: String },
    /// A tool invocation made while answering.
    ToolCall {
        name: String,
        #[serde(default)]
        arguments: Value,
    },
    /// Output returned by a tool.
    ToolOutput {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        output: String,
    },
}

/// Role-specific payload of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    /// Plain text typed by the user.
    User { text: String },
    /// Structured assistant reply.
    Assistant { items: Vec<AssistantItem> },
}

/// A persisted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Server-assigned id, unique within a session.
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Correlation id of the submission that produced this message, if any.
    pub client_message_id: Option<String>,
    pub body: MessageBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    id: String,
    #[serde(alias = "message")]
    content: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(
        rename = "clientMessageId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    client_message_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AssistantContent {
    Items(Vec<AssistantItem>),
    Text(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct AssistantRecord {
    id: String,
    content: AssistantContent,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(
        rename = "clientMessageId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    client_message_id: Option<String>,
}

impl Message {
    /// Create a user message.
    pub fn user(id: impl Into<String>, text: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            client_message_id: None,
            body: MessageBody::User { text: text.into() },
        }
    }

    /// Create an assistant message from its items.
    pub fn assistant(
        id: impl Into<String>,
        items: Vec<AssistantItem>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at,
            client_message_id: None,
            body: MessageBody::Assistant { items },
        }
    }

    /// Builder method to set the client correlation id.
    pub fn with_client_id(mut self, client_message_id: impl Into<String>) -> Self {
        self.client_message_id = Some(client_message_id.into());
        self
    }

    /// Decode a stored record, choosing the payload shape from its `role`.
    pub fn from_record(record: Value) -> Result<Self, BackendError> {
        let role = record
            .get("role")
            .cloned()
            .ok_or_else(|| serde_json::Error::custom("missing field `role`"))?;

        match serde_json::from_value::<Role>(role)? {
            Role::User => {
                let r: UserRecord = serde_json::from_value(record)?;
                Ok(Self {
                    id: r.id,
                    created_at: r.created_at,
                    client_message_id: r.client_message_id,
                    body: MessageBody::User { text: r.content },
                })
            }
            Role::Assistant => {
                let r: AssistantRecord = serde_json::from_value(record)?;
                let items = match r.content {
                    AssistantContent::Items(items) => items,
                    AssistantContent::Text(text) => vec![AssistantItem::OutputText { text }],
                };
                Ok(Self {
                    id: r.id,
                    created_at: r.created_at,
                    client_message_id: r.client_message_id,
                    body: MessageBody::Assistant { items },
                })
            }
        }
    }

    /// Encode the message in its stored record shape.
    pub fn to_record(&self) -> Value {
        let (role, mut record) = match &self.body {
            MessageBody::User { text } => (
                Role::User,
                serde_json::to_value(UserRecord {
                    id: self.id.clone(),
                    content: text.clone(),
                    created_at: self.created_at,
                    client_message_id: self.client_message_id.clone(),
                }),
            ),
            MessageBody::Assistant { items } => (
                Role::Assistant,
                serde_json::to_value(AssistantRecord {
                    id: self.id.clone(),
                    content: AssistantContent::Items(items.clone()),
                    created_at: self.created_at,
                    client_message_id: self.client_message_id.clone(),
                }),
            ),
        };

        if let Ok(Value::Object(map)) = record.as_mut() {
            map.insert("role".to_string(), Value::from(role.as_str()));
        }
        record.unwrap_or(Value::Null)
    }

    /// Author of the message.
    pub fn role(&self) -> Role {
        match self.body {
            MessageBody::User { .. } => Role::User,
            MessageBody::Assistant { .. } => Role::Assistant,
        }
    }

    /// Displayable text: the user's prompt, or the assistant's output text.
    pub fn text(&self) -> String {
        match &self.body {
            MessageBody::User { text } => text.clone(),
            MessageBody::Assistant { items } => items
                .iter()
                .filter_map(|item| match item {
                    AssistantItem::OutputText { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Request sent to the remote chat operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Advisory client-side correlation id; not guaranteed unique.
    #[serde(rename = "clientMessageId", alias = "correlationId")]
    pub correlation_id: String,
}

impl ChatRequest {
    /// Create a new request.
    pub fn new(
        prompt: impl Into<String>,
        session_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: session_id.into(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// Response returned by the remote chat operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl ChatResponse {
    /// A successful response carrying the assistant's final output.
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "Agent run completed successfully".to_string(),
            data: Some(data.into()),
        }
    }

    /// An unsuccessful response with an explanation.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    /// A response only counts as successful if it also carries data.
    pub fn is_success(&self) -> bool {
        self.success && self.data.is_some()
    }
}
