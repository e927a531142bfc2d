use serde::{Deserialize, Serialize};

/// An event that represents the end of a message in a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageStopEvent {}

impl MessageStopEvent {
    /// Create a new `MessageStopEvent`.
    pub fn new() -> Self {
        Self {}
    }
}
