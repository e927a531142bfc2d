//! Console output for streamed replies and session chatter.
//!
//! The reconstructor and the session loop talk to a [`Renderer`]; the
//! plain-text implementation writes to stdout (or any writer, for tests)
//! with optional ANSI styling of thinking text.

use std::io::{self, Stdout, Write};

use crate::conversation::Message;
use crate::types::MessageRole;

/// ANSI escape code for dim text (used for thinking blocks).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for italic text (used for thinking blocks).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Marker printed when a thinking block begins.
pub const THINKING_MARKER: &str = "🧠 Thinking:";

/// Marker printed before the model's answer.
pub const ANSWER_MARKER: &str = "🔮 Claude: ";

/// Marker printed before the user's message.
pub const USER_MARKER: &str = "👤 You: ";

/// Trait for rendering streaming output.
///
/// Calls arrive in stream order: a `start_*`, any number of `print_*`
/// chunks, then the matching `finish_*`.
pub trait Renderer: Send {
    /// Called when a thinking block begins.
    fn start_thinking(&mut self);

    /// Print a chunk of thinking text as soon as it arrives.
    fn print_thinking(&mut self, text: &str);

    /// Called when a thinking block ends.
    fn finish_thinking(&mut self);

    /// Called when an answer block begins.
    fn start_text(&mut self);

    /// Print a chunk of answer text as soon as it arrives.
    fn print_text(&mut self, text: &str);

    /// Called when an answer block ends.
    fn finish_text(&mut self);

    /// Print an informational line.
    fn print_info(&mut self, info: &str);

    /// Print an error line.
    fn print_error(&mut self, error: &str);

    /// Show a stored message, as when replaying a loaded conversation.
    fn show_message(&mut self, message: &Message) {
        match message.role {
            MessageRole::User => {
                self.print_info(&format!("\n{USER_MARKER}{}", message.visible_text));
            }
            MessageRole::Assistant => {
                if let Some(thinking) = &message.thinking_text {
                    self.print_info("");
                    self.start_thinking();
                    self.print_thinking(thinking);
                    self.finish_thinking();
                }
                self.start_text();
                self.print_text(&message.visible_text);
                self.finish_text();
            }
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    in_thinking: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with the given color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            in_thinking: false,
        }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    // Console write failures are not actionable mid-stream.
    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn reset_thinking(&mut self) {
        if self.in_thinking {
            if self.use_color {
                self.write(ANSI_RESET);
            }
            self.in_thinking = false;
        }
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn start_thinking(&mut self) {
        self.write(THINKING_MARKER);
        self.write("\n");
        if self.use_color {
            self.write(ANSI_DIM);
            self.write(ANSI_ITALIC);
        }
        self.in_thinking = true;
    }

    fn print_thinking(&mut self, text: &str) {
        self.write(text);
    }

    fn finish_thinking(&mut self) {
        self.reset_thinking();
        self.write("\n\n");
    }

    fn start_text(&mut self) {
        self.reset_thinking();
        self.write("\n");
        self.write(ANSWER_MARKER);
    }

    fn print_text(&mut self, text: &str) {
        self.write(text);
    }

    fn finish_text(&mut self) {
        self.write("\n");
    }

    fn print_info(&mut self, info: &str) {
        self.reset_thinking();
        self.write(info);
        self.write("\n");
    }

    fn print_error(&mut self, error: &str) {
        self.reset_thinking();
        if self.use_color {
            self.write(&format!("\n{ANSI_RED}Error: {error}{ANSI_RESET}\n"));
        } else {
            self.write(&format!("\nError: {error}\n"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn thinking_then_answer_without_color() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.start_thinking();
        renderer.print_thinking("let me ");
        renderer.print_thinking("see");
        renderer.finish_thinking();
        renderer.start_text();
        renderer.print_text("Hi");
        renderer.finish_text();
        assert_eq!(
            output(renderer),
            "🧠 Thinking:\nlet me see\n\n\n🔮 Claude: Hi\n"
        );
    }

    #[test]
    fn thinking_is_styled_with_color() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.start_thinking();
        renderer.print_thinking("hmm");
        renderer.finish_thinking();
        let out = output(renderer);
        assert!(out.contains(&format!("{ANSI_DIM}{ANSI_ITALIC}hmm{ANSI_RESET}")));
    }

    #[test]
    fn answer_resets_unfinished_thinking_style() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), true);
        renderer.start_thinking();
        renderer.print_thinking("hmm");
        renderer.start_text();
        let out = output(renderer);
        assert!(out.ends_with(&format!("hmm{ANSI_RESET}\n{ANSWER_MARKER}")));
    }

    #[test]
    fn show_stored_messages() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.show_message(&Message::user("Hello"));
        renderer.show_message(&Message::assistant("Hi there", Some("reasoning...".to_string())));
        assert_eq!(
            output(renderer),
            "\n👤 You: Hello\n\n🧠 Thinking:\nreasoning...\n\n\n🔮 Claude: Hi there\n"
        );
    }

    #[test]
    fn error_line() {
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        renderer.print_error("boom");
        assert_eq!(output(renderer), "\nError: boom\n");
    }
}
