use serde::{Deserialize, Serialize};

/// Top-level changes to the message made near the end of a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDelta {
    /// The reason the model stopped generating.
    #[serde(default)]
    pub stop_reason: Option<String>,

    /// Which custom stop sequence was generated, if any.
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// Cumulative usage reported alongside a message delta.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeltaUsage {
    /// The cumulative number of output tokens which were used.
    #[serde(default)]
    pub output_tokens: u32,
}

/// An event that represents a delta update to the message in a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaEvent {
    /// The changes to the message.
    pub delta: MessageDelta,

    /// Usage so far.
    #[serde(default)]
    pub usage: MessageDeltaUsage,
}
