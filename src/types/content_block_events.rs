use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, ContentBlockDelta};

/// An event that represents the start of a content block in a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlockStartEvent {
    /// The content block that is starting.
    pub content_block: ContentBlock,

    /// The index of the content block.
    pub index: usize,
}

impl ContentBlockStartEvent {
    /// Create a new `ContentBlockStartEvent` with the given content block and index.
    pub fn new(content_block: ContentBlock, index: usize) -> Self {
        Self {
            content_block,
            index,
        }
    }
}

/// An event that represents a delta update to a content block in a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlockDeltaEvent {
    /// The delta update to the content block.
    pub delta: ContentBlockDelta,

    /// The index of the content block being updated.
    pub index: usize,
}

impl ContentBlockDeltaEvent {
    /// Create a new `ContentBlockDeltaEvent` with the given delta and index.
    pub fn new(delta: ContentBlockDelta, index: usize) -> Self {
        Self { delta, index }
    }
}

/// An event that represents the end of a content block in a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlockStopEvent {
    /// The index of the content block that is stopping.
    pub index: usize,
}

impl ContentBlockStopEvent {
    /// Create a new `ContentBlockStopEvent` for the given index.
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}
