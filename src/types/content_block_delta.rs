use serde::{Deserialize, Serialize};

use crate::types::{BlockKind, SignatureDelta, TextDelta, ThinkingDelta};

/// A streaming update to the content block currently being generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlockDelta {
    /// A text delta.
    #[serde(rename = "text_delta")]
    TextDelta(TextDelta),

    /// A thinking delta.
    #[serde(rename = "thinking_delta")]
    ThinkingDelta(ThinkingDelta),

    /// A signature delta.
    #[serde(rename = "signature_delta")]
    SignatureDelta(SignatureDelta),

    /// Deltas for block types this client does not render.
    #[serde(other)]
    Other,
}

impl ContentBlockDelta {
    /// Create a text delta.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlockDelta::TextDelta(TextDelta::new(text))
    }

    /// Create a thinking delta.
    pub fn thinking(thinking: impl Into<String>) -> Self {
        ContentBlockDelta::ThinkingDelta(ThinkingDelta::new(thinking))
    }

    /// The channel and text fragment carried by this delta, if any.
    pub fn fragment(&self) -> Option<(BlockKind, &str)> {
        match self {
            ContentBlockDelta::TextDelta(delta) => Some((BlockKind::Text, &delta.text)),
            ContentBlockDelta::ThinkingDelta(delta) => {
                Some((BlockKind::Thinking, &delta.thinking))
            }
            ContentBlockDelta::SignatureDelta(_) | ContentBlockDelta::Other => None,
        }
    }
}
