use serde::{Deserialize, Serialize};

use crate::types::{MessageParam, Model};

/// Request body for `POST /v1/messages/count_tokens`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCountTokensParams {
    /// The model whose tokenizer is used.
    pub model: Model,

    /// The messages to count.
    pub messages: Vec<MessageParam>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl MessageCountTokensParams {
    /// Create new token-count parameters.
    pub fn new(messages: Vec<MessageParam>, model: Model) -> Self {
        Self {
            model,
            messages,
            system: None,
        }
    }

    /// Sets the system prompt.
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }
}
