use serde::{Deserialize, Serialize};

/// A block of visible response text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// The text content; empty when announced by a stream start event.
    #[serde(default)]
    pub text: String,
}

impl TextBlock {
    /// Create a new `TextBlock` with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
