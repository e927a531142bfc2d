//! A terminal chat client for the Anthropic Messages API with streamed
//! extended thinking, saved conversations and reusable system prompts.

// Public modules
pub mod client;
pub mod conversation;
pub mod error;
pub mod menu;
pub mod reconstruct;
pub mod render;
pub mod session;
pub mod settings;
pub mod sse;
pub mod store;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use client::{Anthropic, ChatBackend, EventStream};
pub use conversation::{Conversation, ConversationMetadata, Message, SystemPrompt};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use reconstruct::{BlockState, StreamReconstructor, reconstruct};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{ChatSession, TokenCount, TurnReport, is_exit_command};
pub use settings::{Settings, SettingsEdit, SettingsField};
pub use store::{ConversationStore, PromptStore};
pub use types::*;
