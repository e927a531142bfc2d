//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! This module turns the raw byte stream of a streaming Messages API
//! response into parsed `MessageStreamEvent`s, handling buffering across
//! network chunks, UTF-8 sequences split between chunks, and in-band
//! error events.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::types::{
    ContentBlockDeltaEvent, ContentBlockStartEvent, ContentBlockStopEvent, MessageDeltaEvent,
    MessageStartEvent, MessageStopEvent, MessageStreamEvent,
};
use crate::{Error, Result};

/// Process a stream of bytes into a stream of server-sent events.
///
/// Transport errors and malformed events are yielded as `Err` items; the
/// consumer decides whether to stop.  Unknown event types are skipped.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<MessageStreamEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    // Convert transport errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let state = SseState {
        buffer: String::new(),
        pending: Vec::new(),
        done: false,
    };

    stream::unfold((stream, state), |(mut stream, mut state)| async move {
        loop {
            // First check if we have a complete event in the buffer
            if let Some((event, remaining)) = extract_event(&state.buffer) {
                state.buffer = remaining;
                match event {
                    Some(event) => {
                        record(&event);
                        return Some((event, (stream, state)));
                    }
                    None => continue,
                }
            }
            if state.done {
                return None;
            }

            // Read more data
            match stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    if let Err(err) = state.push_bytes(&bytes) {
                        STREAM_ERRORS.click();
                        return Some((Err(err), (stream, state)));
                    }
                }
                Some(Err(e)) => {
                    STREAM_ERRORS.click();
                    return Some((Err(e), (stream, state)));
                }
                None => {
                    // End of stream; a final event may lack its blank line.
                    state.done = true;
                    if !state.buffer.trim().is_empty() {
                        state.buffer.push_str("\n\n");
                    }
                    if !state.pending.is_empty() {
                        let trailing = std::mem::take(&mut state.pending);
                        STREAM_ERRORS.click();
                        return Some((
                            Err(Error::encoding(
                                format!(
                                    "Stream ended inside a UTF-8 sequence ({} trailing bytes)",
                                    trailing.len()
                                ),
                                None,
                            )),
                            (stream, state),
                        ));
                    }
                }
            }
        }
    })
}

struct SseState {
    buffer: String,
    pending: Vec<u8>,
    done: bool,
}

impl SseState {
    /// Append bytes, holding back an incomplete trailing UTF-8 sequence.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                self.pending.clear();
                return Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {err}"),
                    Some(Box::new(err)),
                ));
            }
        };
        let rest = self.pending.split_off(valid);
        let text = String::from_utf8(std::mem::replace(&mut self.pending, rest))
            .map_err(|e| Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e))))?;
        self.buffer.push_str(&text.replace("\r\n", "\n"));
        Ok(())
    }
}

fn record(event: &Result<MessageStreamEvent>) {
    match event {
        Ok(_) => STREAM_EVENTS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
}

/// Extract a complete SSE event from a buffer string.
///
/// Returns `None` when no complete event is buffered yet.  The inner option
/// is `None` for frames that are complete but carry nothing to deliver.
fn extract_event(buffer: &str) -> Option<(Option<Result<MessageStreamEvent>>, String)> {
    // Each event is delimited by a blank line
    let (event_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let mut event_type = None;
    let mut data_lines = Vec::new();
    let mut has_content = false;
    for line in event_text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        has_content = true;
        if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if !has_content {
        // Blank or comment-only frame.
        return Some((None, rest));
    }
    let Some(event_type) = event_type else {
        return Some((
            Some(Err(Error::serialization(
                format!("Malformed SSE event: missing 'event:' line in '{event_text}'"),
                None,
            ))),
            rest,
        ));
    };
    if data_lines.is_empty() {
        return Some((
            Some(Err(Error::serialization(
                format!("Malformed SSE event: missing 'data:' line in '{event_text}'"),
                None,
            ))),
            rest,
        ));
    }
    let event_data = data_lines.join("\n");

    Some((parse_event_type(event_type, &event_data), rest))
}

/// Parse a specific SSE event type and its data.
fn parse_event_type(event_type: &str, event_data: &str) -> Option<Result<MessageStreamEvent>> {
    fn parse<'a, T: Deserialize<'a>>(
        data: &'a str,
        wrap: fn(T) -> MessageStreamEvent,
    ) -> Option<Result<MessageStreamEvent>> {
        Some(serde_json::from_str::<T>(data).map(wrap).map_err(Error::from))
    }

    match event_type {
        "ping" => Some(Ok(MessageStreamEvent::Ping)),
        "message_start" => parse::<MessageStartEvent>(event_data, MessageStreamEvent::MessageStart),
        "message_delta" => parse::<MessageDeltaEvent>(event_data, MessageStreamEvent::MessageDelta),
        "message_stop" => parse::<MessageStopEvent>(event_data, MessageStreamEvent::MessageStop),
        "content_block_start" => {
            parse::<ContentBlockStartEvent>(event_data, MessageStreamEvent::ContentBlockStart)
        }
        "content_block_delta" => {
            parse::<ContentBlockDeltaEvent>(event_data, MessageStreamEvent::ContentBlockDelta)
        }
        "content_block_stop" => {
            parse::<ContentBlockStopEvent>(event_data, MessageStreamEvent::ContentBlockStop)
        }
        "error" => Some(Err(stream_error(event_data))),
        other => {
            tracing::debug!(event_type = other, "skipping unknown SSE event");
            None
        }
    }
}

/// Convert an in-band `error` event into an API error.
fn stream_error(event_data: &str) -> Error {
    #[derive(Deserialize)]
    struct ErrorEvent {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    }

    match serde_json::from_str::<ErrorEvent>(event_data) {
        Ok(ErrorEvent { error }) => Error::api(
            500,
            error.error_type.or_else(|| Some("stream_error".to_string())),
            error.message.unwrap_or_else(|| event_data.to_string()),
            None,
        ),
        Err(_) => Error::api(
            500,
            Some("stream_error".to_string()),
            event_data.to_string(),
            None,
        ),
    }
}
