//! Conversation records as they are stored on disk.

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::types::{MessageParam, MessageRole};

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub role: MessageRole,

    /// The text shown to the user and replayed to the model.
    #[serde(rename = "content")]
    pub visible_text: String,

    /// The model's reasoning trace; assistant messages only.
    #[serde(
        rename = "thinking",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty"
    )]
    pub thinking_text: Option<String>,

    /// When the message was completed.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

impl Message {
    /// A user message timestamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            visible_text: text.into(),
            thinking_text: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// An assistant message timestamped now.  Empty thinking is dropped.
    pub fn assistant(text: impl Into<String>, thinking: Option<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            visible_text: text.into(),
            thinking_text: thinking.filter(|t| !t.is_empty()),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// The request-history form of this message.  Thinking is never included.
    pub fn to_param(&self) -> MessageParam {
        MessageParam::new(self.visible_text.clone(), self.role)
    }
}

/// A named system prompt, copied by value into the conversations that use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// File name of the prompt, extension included.
    pub name: String,
    /// The prompt text.
    pub content: String,
}

/// Everything about a conversation except its messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,
    pub model: String,
    pub name: String,
    #[serde(default)]
    pub system_prompt: Option<SystemPrompt>,
}

/// A conversation: metadata plus an append-only list of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub metadata: ConversationMetadata,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(skip)]
    file_name: Option<String>,
}

impl Conversation {
    /// Start an empty conversation created now.
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        system_prompt: Option<SystemPrompt>,
    ) -> Self {
        Self {
            metadata: ConversationMetadata {
                created_at: OffsetDateTime::now_utc(),
                model: model.into(),
                name: name.into(),
                system_prompt,
            },
            messages: Vec::new(),
            file_name: None,
        }
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The file this conversation was loaded from or saved to, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub(crate) fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.file_name = Some(file_name.into());
    }

    /// The messages in order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop messages past `len`; only for turns that were never persisted.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// The history to send with the next request.
    pub fn api_history(&self) -> Vec<MessageParam> {
        self.messages.iter().map(Message::to_param).collect()
    }

    /// The system prompt text, if the conversation has one.
    pub fn system_text(&self) -> Option<&str> {
        self.metadata
            .system_prompt
            .as_ref()
            .map(|prompt| prompt.content.as_str())
    }
}
