//! The chat loop for one conversation.
//!
//! A [`ChatSession`] sends each user message with the full visible history,
//! reconstructs the streamed reply, and saves the conversation after every
//! turn.  A failed turn leaves both the file and the in-memory conversation
//! as they were before it started.

use std::fmt;
use std::time::Instant;

use crate::client::ChatBackend;
use crate::conversation::{Conversation, Message};
use crate::error::{Error, Result};
use crate::observability::{TOKEN_COUNT_FAILURES, TURNS, TURN_DURATION, TURN_FAILURES};
use crate::reconstruct::reconstruct;
use crate::render::{Renderer, USER_MARKER};
use crate::settings::Settings;
use crate::store::ConversationStore;
use crate::types::{MessageCountTokensParams, MessageCreateParams};

/// Input that ends the session, compared case-insensitively.
pub const EXIT_COMMAND: &str = "exit";

/// Returns true if `input` asks to leave the session.
pub fn is_exit_command(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Token count of the conversation after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCount {
    Known(u32),
    Unknown,
}

impl fmt::Display for TokenCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenCount::Known(count) => write!(f, "{count}"),
            TokenCount::Unknown => f.write_str("Unknown"),
        }
    }
}

/// What a successful turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub reply: Message,
    pub tokens: TokenCount,
}

/// A chat session over one conversation.
pub struct ChatSession<'a, B: ChatBackend + ?Sized> {
    backend: &'a B,
    store: &'a ConversationStore,
    settings: &'a Settings,
    conversation: Conversation,
}

impl<'a, B: ChatBackend + ?Sized> ChatSession<'a, B> {
    pub fn new(
        backend: &'a B,
        store: &'a ConversationStore,
        settings: &'a Settings,
        conversation: Conversation,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
            conversation,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// Print the session header and replay the stored history.
    pub fn intro(&self, renderer: &mut dyn Renderer) {
        renderer.print_info(&format!("\nChat session: {}", self.conversation.name()));
        if let Some(prompt) = &self.conversation.metadata.system_prompt {
            renderer.print_info(&format!("\nUsing system prompt: {}", prompt.name));
        }
        renderer.print_info(&format!("Type '{EXIT_COMMAND}' to return to the main menu.\n"));
        for message in self.conversation.messages() {
            renderer.show_message(message);
        }
    }

    /// Run turns until `read_line` runs dry or the user types `exit`.
    ///
    /// Failed turns are reported through `renderer` and the loop continues.
    pub async fn run<F>(&mut self, mut read_line: F, renderer: &mut dyn Renderer)
    where
        F: FnMut(&str) -> Option<String>,
    {
        self.intro(renderer);
        while let Some(line) = read_line(&format!("\n{USER_MARKER}")) {
            if line.trim().is_empty() {
                continue;
            }
            if is_exit_command(&line) {
                break;
            }
            renderer.print_info("\nProcessing...\n");
            match self.send_turn(&line, renderer).await {
                Ok(report) => {
                    renderer.print_info(&format!(
                        "\nCurrent conversation token count: {}",
                        report.tokens
                    ));
                }
                Err(err) => renderer.print_error(&err.to_string()),
            }
        }
    }

    /// Send one user message and persist the exchange.
    pub async fn send_turn(&mut self, input: &str, renderer: &mut dyn Renderer) -> Result<TurnReport> {
        TURNS.click();
        let start = Instant::now();
        let previous_len = self.conversation.messages().len();
        self.conversation.push(Message::user(input));

        let reply = match self.exchange(renderer).await {
            Ok(reply) => reply,
            Err(err) => {
                self.conversation.truncate(previous_len);
                TURN_FAILURES.click();
                tracing::error!(
                    error = %err,
                    request_id = err.request_id(),
                    conversation = self.conversation.name(),
                    "turn aborted"
                );
                return Err(err);
            }
        };
        TURN_DURATION.add(start.elapsed().as_secs_f64());

        let tokens = self.count_tokens().await;
        Ok(TurnReport { reply, tokens })
    }

    /// Stream the reply, append it and save.  The caller rolls back on error.
    async fn exchange(&mut self, renderer: &mut dyn Renderer) -> Result<Message> {
        let parameters = &self.settings.parameters;
        let params = MessageCreateParams::new(
            parameters.max_tokens,
            self.conversation.api_history(),
            self.settings.model().clone(),
        )
        .with_system(self.conversation.system_text().map(String::from))
        .with_temperature(parameters.temperature)
        .with_thinking(self.settings.thinking());
        tracing::debug!(
            model = %params.model,
            messages = params.messages.len(),
            "requesting completion"
        );

        let stream = self.backend.stream(params).await?;
        let reply = reconstruct(stream, renderer).await?;
        if reply.visible_text.is_empty() {
            return Err(Error::streaming("reply carried no answer text", None));
        }
        self.conversation.push(reply.clone());
        self.store.save(&self.conversation)?;
        Ok(reply)
    }

    async fn count_tokens(&self) -> TokenCount {
        let params = MessageCountTokensParams::new(
            self.conversation.api_history(),
            self.settings.model().clone(),
        )
        .with_system(self.conversation.system_text().map(String::from));
        match self.backend.count_tokens(params).await {
            Ok(count) => TokenCount::Known(count.input_tokens),
            Err(err) => {
                TOKEN_COUNT_FAILURES.click();
                tracing::warn!(error = %err, "token count unavailable");
                TokenCount::Unknown
            }
        }
    }
}
