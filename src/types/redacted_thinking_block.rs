use serde::{Deserialize, Serialize};

/// A thinking block whose content the API returned in encrypted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedThinkingBlock {
    /// Opaque encrypted payload.
    pub data: String,
}
