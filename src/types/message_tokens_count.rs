use serde::{Deserialize, Serialize};

/// Count of tokens in a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageTokensCount {
    /// The total number of tokens across the provided list of messages and system prompt.
    pub input_tokens: u32,
}

impl MessageTokensCount {
    /// Create a new `MessageTokensCount` with the given input tokens.
    pub fn new(input_tokens: u32) -> Self {
        Self { input_tokens }
    }
}
