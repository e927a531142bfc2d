// Public modules
pub mod content_block;
pub mod content_block_delta;
pub mod content_block_events;
pub mod message_count_tokens_params;
pub mod message_create_params;
pub mod message_delta_event;
pub mod message_param;
pub mod message_start_event;
pub mod message_stop_event;
pub mod message_stream_event;
pub mod message_tokens_count;
pub mod model;
pub mod redacted_thinking_block;
pub mod signature_delta;
pub mod text_block;
pub mod text_delta;
pub mod thinking_block;
pub mod thinking_config;
pub mod thinking_delta;
pub mod usage;

// Re-exports
pub use content_block::{BlockKind, ContentBlock};
pub use content_block_delta::ContentBlockDelta;
pub use content_block_events::{
    ContentBlockDeltaEvent, ContentBlockStartEvent, ContentBlockStopEvent,
};
pub use message_count_tokens_params::MessageCountTokensParams;
pub use message_create_params::MessageCreateParams;
pub use message_delta_event::{MessageDelta, MessageDeltaEvent, MessageDeltaUsage};
pub use message_param::{MessageParam, MessageRole};
pub use message_start_event::{MessageStartEvent, StartedMessage};
pub use message_stop_event::MessageStopEvent;
pub use message_stream_event::MessageStreamEvent;
pub use message_tokens_count::MessageTokensCount;
pub use model::{KnownModel, Model};
pub use redacted_thinking_block::RedactedThinkingBlock;
pub use signature_delta::SignatureDelta;
pub use text_block::TextBlock;
pub use text_delta::TextDelta;
pub use thinking_block::ThinkingBlock;
pub use thinking_config::ThinkingConfig;
pub use thinking_delta::ThinkingDelta;
pub use usage::Usage;
