use serde::{Deserialize, Serialize};

use crate::types::{MessageParam, Model, ThinkingConfig};

/// Request body for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCreateParams {
    /// The model that will complete the prompt.
    pub model: Model,

    /// The maximum number of tokens to generate, thinking included.
    pub max_tokens: u32,

    /// Input messages, alternating user and assistant turns.
    pub messages: Vec<MessageParam>,

    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Amount of randomness injected into the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Extended thinking configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,

    /// Whether to incrementally stream the response using server-sent events.
    #[serde(default)]
    pub stream: bool,
}

impl MessageCreateParams {
    /// Create new parameters with the required fields and streaming enabled.
    pub fn new(max_tokens: u32, messages: Vec<MessageParam>, model: Model) -> Self {
        Self {
            model,
            max_tokens,
            messages,
            system: None,
            temperature: None,
            thinking: None,
            stream: true,
        }
    }

    /// Sets the system prompt.
    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the extended thinking configuration.
    pub fn with_thinking(mut self, thinking: ThinkingConfig) -> Self {
        self.thinking = Some(thinking);
        self
    }
}
