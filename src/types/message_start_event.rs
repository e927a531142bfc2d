use serde::{Deserialize, Serialize};

use crate::types::Usage;

/// The message envelope announced at the start of a stream.
///
/// Content arrives later through content block events, so only the
/// identifying fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartedMessage {
    /// Unique object identifier.
    #[serde(default)]
    pub id: String,

    /// The model that handled the request.
    #[serde(default)]
    pub model: String,

    /// Usage at the start of the message; input tokens are final here.
    #[serde(default)]
    pub usage: Usage,
}

/// An event that represents the start of a message in a streaming response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageStartEvent {
    /// The message that is starting.
    pub message: StartedMessage,
}
