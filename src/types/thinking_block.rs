use serde::{Deserialize, Serialize};

/// A block of extended-thinking output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    /// The thinking content.
    #[serde(default)]
    pub thinking: String,

    /// Signature the API uses to verify the thinking was not altered.
    #[serde(default)]
    pub signature: String,
}

impl ThinkingBlock {
    /// Create a new `ThinkingBlock` with the given thinking text.
    pub fn new(thinking: impl Into<String>) -> Self {
        Self {
            thinking: thinking.into(),
            signature: String::new(),
        }
    }
}
