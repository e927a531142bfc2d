use serde::{Deserialize, Serialize};

/// Configuration for Claude's extended thinking.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ThinkingConfig {
    /// Enabled thinking configuration with a token budget.
    #[serde(rename = "enabled")]
    Enabled {
        /// How many tokens Claude can use for its internal reasoning.
        ///
        /// Must be at least 1024 and less than `max_tokens`.
        budget_tokens: u32,
    },
}

impl ThinkingConfig {
    pub fn enabled(budget_tokens: u32) -> Self {
        Self::Enabled { budget_tokens }
    }
}
