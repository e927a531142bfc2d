use serde::{Deserialize, Serialize};

/// Billing and rate-limit usage reported by the API.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// The number of input tokens which were used.
    #[serde(default)]
    pub input_tokens: u32,

    /// The number of output tokens which were used.
    #[serde(default)]
    pub output_tokens: u32,
}
