//! Rebuilds a reply from the incremental events of a streaming completion.
//!
//! [`StreamReconstructor`] is a small state machine: a block start moves it
//! into thinking or answer mode, deltas of the matching kind are appended and
//! echoed straight away, and a block stop returns it to idle.  Deltas that do
//! not match the current block are dropped.  [`reconstruct`] drives it over
//! any event stream and yields the finished assistant [`Message`].

use futures::{Stream, StreamExt, pin_mut};

use crate::conversation::Message;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::types::{BlockKind, MessageStreamEvent};

/// Which block the reconstructor is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Idle,
    InThinking,
    InText,
}

/// Accumulates thinking and answer text from stream events.
#[derive(Debug, Default)]
pub struct StreamReconstructor {
    state: BlockState,
    thinking: String,
    text: String,
    stopped: bool,
}

impl StreamReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// True once `message_stop` has been seen.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Thinking text accumulated so far.
    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    /// Answer text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Apply one event, echoing any output through `renderer`.
    pub fn apply(&mut self, event: &MessageStreamEvent, renderer: &mut dyn Renderer) {
        if self.stopped {
            return;
        }
        match event {
            MessageStreamEvent::ContentBlockStart(start) => {
                match start.content_block.kind() {
                    Some(BlockKind::Thinking) => {
                        self.state = BlockState::InThinking;
                        renderer.start_thinking();
                    }
                    Some(BlockKind::Text) => {
                        self.state = BlockState::InText;
                        renderer.start_text();
                    }
                    None => {
                        tracing::debug!(index = start.index, "ignoring non-text content block");
                        self.state = BlockState::Idle;
                    }
                }
            }
            MessageStreamEvent::ContentBlockDelta(delta) => {
                match (self.state, delta.delta.fragment()) {
                    (BlockState::InThinking, Some((BlockKind::Thinking, fragment))) => {
                        self.thinking.push_str(fragment);
                        renderer.print_thinking(fragment);
                    }
                    (BlockState::InText, Some((BlockKind::Text, fragment))) => {
                        self.text.push_str(fragment);
                        renderer.print_text(fragment);
                    }
                    _ => {}
                }
            }
            MessageStreamEvent::ContentBlockStop(_) => {
                match self.state {
                    BlockState::InThinking => renderer.finish_thinking(),
                    BlockState::InText => renderer.finish_text(),
                    BlockState::Idle => {}
                }
                self.state = BlockState::Idle;
            }
            MessageStreamEvent::MessageStop(_) => {
                self.stopped = true;
            }
            MessageStreamEvent::Ping
            | MessageStreamEvent::MessageStart(_)
            | MessageStreamEvent::MessageDelta(_) => {}
        }
    }

    /// Turn the buffers into an assistant message timestamped now.
    pub fn finish(self) -> Message {
        Message::assistant(self.text, Some(self.thinking))
    }
}

/// Drive a [`StreamReconstructor`] over `stream` until `message_stop`.
///
/// The first error item aborts reconstruction and partial text is discarded.
/// A stream that runs dry before `message_stop` is a streaming error.
pub async fn reconstruct<S>(stream: S, renderer: &mut dyn Renderer) -> Result<Message>
where
    S: Stream<Item = Result<MessageStreamEvent>>,
{
    pin_mut!(stream);
    let mut reconstructor = StreamReconstructor::new();
    while let Some(event) = stream.next().await {
        reconstructor.apply(&event?, renderer);
        if reconstructor.is_stopped() {
            break;
        }
    }
    if !reconstructor.is_stopped() {
        tracing::debug!(
            received = reconstructor.text().len(),
            "stream ended without message_stop"
        );
        return Err(Error::streaming("stream ended before message_stop", None));
    }
    Ok(reconstructor.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ContentBlock, ContentBlockDelta, ContentBlockDeltaEvent, ContentBlockStartEvent,
        RedactedThinkingBlock, SignatureDelta,
    };
    use futures::stream;

    /// Records renderer calls for assertions.
    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
    }

    impl Renderer for Recording {
        fn start_thinking(&mut self) {
            self.calls.push("start_thinking".to_string());
        }
        fn print_thinking(&mut self, text: &str) {
            self.calls.push(format!("thinking:{text}"));
        }
        fn finish_thinking(&mut self) {
            self.calls.push("finish_thinking".to_string());
        }
        fn start_text(&mut self) {
            self.calls.push("start_text".to_string());
        }
        fn print_text(&mut self, text: &str) {
            self.calls.push(format!("text:{text}"));
        }
        fn finish_text(&mut self) {
            self.calls.push("finish_text".to_string());
        }
        fn print_info(&mut self, info: &str) {
            self.calls.push(format!("info:{info}"));
        }
        fn print_error(&mut self, error: &str) {
            self.calls.push(format!("error:{error}"));
        }
    }

    fn run(events: &[MessageStreamEvent]) -> (StreamReconstructor, Recording) {
        let mut renderer = Recording::default();
        let mut reconstructor = StreamReconstructor::new();
        for event in events {
            reconstructor.apply(event, &mut renderer);
        }
        (reconstructor, renderer)
    }

    fn exchange() -> Vec<MessageStreamEvent> {
        vec![
            MessageStreamEvent::Ping,
            MessageStreamEvent::thinking_start(0),
            MessageStreamEvent::thinking_delta(0, "reason"),
            MessageStreamEvent::thinking_delta(0, "ing..."),
            MessageStreamEvent::block_stop(0),
            MessageStreamEvent::text_start(1),
            MessageStreamEvent::text_delta(1, "Hi "),
            MessageStreamEvent::text_delta(1, "there"),
            MessageStreamEvent::block_stop(1),
            MessageStreamEvent::message_stop(),
        ]
    }

    #[test]
    fn thinking_then_text() {
        let (reconstructor, renderer) = run(&exchange());
        assert_eq!(reconstructor.state(), BlockState::Idle);
        assert_eq!(
            renderer.calls,
            vec![
                "start_thinking",
                "thinking:reason",
                "thinking:ing...",
                "finish_thinking",
                "start_text",
                "text:Hi ",
                "text:there",
                "finish_text",
            ]
        );
        let message = reconstructor.finish();
        assert_eq!(message.visible_text, "Hi there");
        assert_eq!(message.thinking_text.as_deref(), Some("reasoning..."));
    }

    #[test]
    fn text_before_block_start_is_dropped() {
        let (reconstructor, renderer) = run(&[
            MessageStreamEvent::text_delta(0, "early"),
            MessageStreamEvent::text_start(0),
            MessageStreamEvent::text_delta(0, "late"),
        ]);
        assert_eq!(reconstructor.text(), "late");
        assert!(!renderer.calls.contains(&"text:early".to_string()));
    }

    #[test]
    fn mismatched_delta_is_dropped() {
        let (reconstructor, _) = run(&[
            MessageStreamEvent::thinking_start(0),
            MessageStreamEvent::text_delta(0, "wrong"),
            MessageStreamEvent::thinking_delta(0, "right"),
        ]);
        assert_eq!(reconstructor.thinking(), "right");
        assert_eq!(reconstructor.text(), "");
    }

    #[test]
    fn text_start_exits_thinking() {
        let (reconstructor, renderer) = run(&[
            MessageStreamEvent::thinking_start(0),
            MessageStreamEvent::thinking_delta(0, "hmm"),
            MessageStreamEvent::text_start(1),
            MessageStreamEvent::thinking_delta(1, "stray"),
            MessageStreamEvent::text_delta(1, "answer"),
        ]);
        assert_eq!(reconstructor.state(), BlockState::InText);
        assert_eq!(reconstructor.thinking(), "hmm");
        assert_eq!(reconstructor.text(), "answer");
        assert!(!renderer.calls.contains(&"finish_thinking".to_string()));
    }

    #[test]
    fn stop_while_idle_is_noop() {
        let (reconstructor, renderer) = run(&[MessageStreamEvent::block_stop(0)]);
        assert_eq!(reconstructor.state(), BlockState::Idle);
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn other_block_kinds_go_idle() {
        let redacted = MessageStreamEvent::ContentBlockStart(ContentBlockStartEvent::new(
            ContentBlock::RedactedThinking(RedactedThinkingBlock {
                data: "opaque".to_string(),
            }),
            1,
        ));
        let (reconstructor, _) = run(&[
            MessageStreamEvent::text_start(0),
            redacted,
            MessageStreamEvent::text_delta(1, "misattributed"),
        ]);
        assert_eq!(reconstructor.state(), BlockState::Idle);
        assert_eq!(reconstructor.text(), "");
    }

    #[test]
    fn signature_delta_is_ignored() {
        let signature = MessageStreamEvent::ContentBlockDelta(ContentBlockDeltaEvent::new(
            ContentBlockDelta::SignatureDelta(SignatureDelta {
                signature: "sig".to_string(),
            }),
            0,
        ));
        let (reconstructor, _) = run(&[
            MessageStreamEvent::thinking_start(0),
            signature,
            MessageStreamEvent::thinking_delta(0, "x"),
        ]);
        assert_eq!(reconstructor.thinking(), "x");
    }

    #[test]
    fn events_after_message_stop_are_ignored() {
        let (reconstructor, renderer) = run(&[
            MessageStreamEvent::message_stop(),
            MessageStreamEvent::text_start(0),
            MessageStreamEvent::text_delta(0, "late"),
        ]);
        assert!(reconstructor.is_stopped());
        assert_eq!(reconstructor.text(), "");
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn empty_thinking_is_none() {
        let (reconstructor, _) = run(&[
            MessageStreamEvent::text_start(0),
            MessageStreamEvent::text_delta(0, "plain"),
        ]);
        let message = reconstructor.finish();
        assert_eq!(message.thinking_text, None);
        assert_eq!(message.visible_text, "plain");
    }

    #[tokio::test]
    async fn drive_stream() {
        let events = stream::iter(exchange().into_iter().map(Ok));
        let mut renderer = Recording::default();
        let message = reconstruct(events, &mut renderer).await.unwrap();
        assert_eq!(message.visible_text, "Hi there");
        assert_eq!(message.thinking_text.as_deref(), Some("reasoning..."));
    }

    #[tokio::test]
    async fn stops_reading_after_message_stop() {
        let events = stream::iter(vec![
            Ok(MessageStreamEvent::text_start(0)),
            Ok(MessageStreamEvent::text_delta(0, "done")),
            Ok(MessageStreamEvent::message_stop()),
            Err(Error::streaming("never read", None)),
        ]);
        let mut renderer = Recording::default();
        let message = reconstruct(events, &mut renderer).await.unwrap();
        assert_eq!(message.visible_text, "done");
    }

    #[tokio::test]
    async fn error_aborts() {
        let events = stream::iter(vec![
            Ok(MessageStreamEvent::text_start(0)),
            Ok(MessageStreamEvent::text_delta(0, "partial")),
            Err(Error::streaming("connection reset", None)),
        ]);
        let mut renderer = Recording::default();
        let err = reconstruct(events, &mut renderer).await.unwrap_err();
        assert!(err.is_streaming());
    }

    #[tokio::test]
    async fn exhaustion_without_message_stop_is_error() {
        let events = stream::iter(vec![
            Ok(MessageStreamEvent::text_start(0)),
            Ok(MessageStreamEvent::text_delta(0, "cut")),
        ]);
        let mut renderer = Recording::default();
        let err = reconstruct(events, &mut renderer).await.unwrap_err();
        assert!(err.is_streaming());
    }

    #[tokio::test]
    async fn empty_stream_is_error() {
        let events = stream::iter(Vec::<Result<MessageStreamEvent>>::new());
        let mut renderer = Recording::default();
        let err = reconstruct(events, &mut renderer).await.unwrap_err();
        assert!(err.is_streaming());
        assert!(renderer.calls.is_empty());
    }
}
