use serde::{Deserialize, Serialize};

use crate::types::{RedactedThinkingBlock, TextBlock, ThinkingBlock};

/// The kind of reply channel a content block belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// The model's reasoning trace.
    Thinking,

    /// The visible answer.
    Text,
}

/// A content block as announced by a `content_block_start` event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// A text block.
    #[serde(rename = "text")]
    Text(TextBlock),

    /// A thinking block.
    #[serde(rename = "thinking")]
    Thinking(ThinkingBlock),

    /// A thinking block whose content was encrypted by the API.
    #[serde(rename = "redacted_thinking")]
    RedactedThinking(RedactedThinkingBlock),

    /// Any block type this client does not render (tool use, citations, ...).
    #[serde(other)]
    Other,
}

impl ContentBlock {
    /// The reply channel this block feeds, if it feeds one at all.
    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            ContentBlock::Text(_) => Some(BlockKind::Text),
            ContentBlock::Thinking(_) => Some(BlockKind::Thinking),
            ContentBlock::RedactedThinking(_) | ContentBlock::Other => None,
        }
    }
}
