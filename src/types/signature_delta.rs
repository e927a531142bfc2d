use serde::{Deserialize, Serialize};

/// The signature that closes a thinking block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureDelta {
    /// The signature content.
    pub signature: String,
}
