use serde::{Deserialize, Serialize};

use crate::types::{
    ContentBlock, ContentBlockDelta, ContentBlockDeltaEvent, ContentBlockStartEvent,
    ContentBlockStopEvent, MessageDeltaEvent, MessageStartEvent, MessageStopEvent, TextBlock,
    ThinkingBlock,
};

/// An event in a message stream.
///
/// Events are delivered in a specific order: message_start, then any number
/// of content block start/delta/stop runs, a message_delta, and finally
/// message_stop.  Pings may appear anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum MessageStreamEvent {
    /// A periodic ping event to keep the connection alive.
    #[serde(rename = "ping")]
    Ping,

    /// Indicates the start of a new message in the stream.
    #[serde(rename = "message_start")]
    MessageStart(MessageStartEvent),

    /// Provides stop reason and usage updates for the message.
    #[serde(rename = "message_delta")]
    MessageDelta(MessageDeltaEvent),

    /// Marks the beginning of a new content block within the message.
    #[serde(rename = "content_block_start")]
    ContentBlockStart(ContentBlockStartEvent),

    /// Provides incremental updates to the current content block.
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta(ContentBlockDeltaEvent),

    /// Indicates that the current content block is complete.
    #[serde(rename = "content_block_stop")]
    ContentBlockStop(ContentBlockStopEvent),

    /// Marks the end of the message stream.
    #[serde(rename = "message_stop")]
    MessageStop(MessageStopEvent),
}

impl MessageStreamEvent {
    /// A `content_block_start` announcing a thinking block.
    pub fn thinking_start(index: usize) -> Self {
        MessageStreamEvent::ContentBlockStart(ContentBlockStartEvent::new(
            ContentBlock::Thinking(ThinkingBlock::default()),
            index,
        ))
    }

    /// A `content_block_start` announcing a text block.
    pub fn text_start(index: usize) -> Self {
        MessageStreamEvent::ContentBlockStart(ContentBlockStartEvent::new(
            ContentBlock::Text(TextBlock::default()),
            index,
        ))
    }

    /// A `content_block_delta` carrying thinking text.
    pub fn thinking_delta(index: usize, thinking: impl Into<String>) -> Self {
        MessageStreamEvent::ContentBlockDelta(ContentBlockDeltaEvent::new(
            ContentBlockDelta::thinking(thinking),
            index,
        ))
    }

    /// A `content_block_delta` carrying answer text.
    pub fn text_delta(index: usize, text: impl Into<String>) -> Self {
        MessageStreamEvent::ContentBlockDelta(ContentBlockDeltaEvent::new(
            ContentBlockDelta::text(text),
            index,
        ))
    }

    /// A `content_block_stop`.
    pub fn block_stop(index: usize) -> Self {
        MessageStreamEvent::ContentBlockStop(ContentBlockStopEvent::new(index))
    }

    /// A `message_stop`.
    pub fn message_stop() -> Self {
        MessageStreamEvent::MessageStop(MessageStopEvent::new())
    }
}
