//! End-to-end tests driving chat sessions against a scripted backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;

use thinkchat::{
    ChatBackend, ChatSession, ConversationStore, Error, EventStream, MessageCountTokensParams,
    MessageCreateParams, MessageParam, MessageRole, MessageStreamEvent, MessageTokensCount,
    PlainTextRenderer, PromptStore, Result, Settings, TokenCount,
};

/// A backend that replays canned event sequences and records requests.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Vec<Result<MessageStreamEvent>>>>,
    requests: Mutex<Vec<MessageCreateParams>>,
    count: Option<u32>,
}

impl ScriptedBackend {
    fn new(count: Option<u32>) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    fn reply(self, events: Vec<Result<MessageStreamEvent>>) -> Self {
        self.replies.lock().unwrap().push_back(events);
        self
    }

    fn requests(&self) -> Vec<MessageCreateParams> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn stream(&self, params: MessageCreateParams) -> Result<EventStream> {
        self.requests.lock().unwrap().push(params);
        let events = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::service_unavailable("no scripted reply", None))?;
        Ok(Box::pin(stream::iter(events)))
    }

    async fn count_tokens(&self, _: MessageCountTokensParams) -> Result<MessageTokensCount> {
        match self.count {
            Some(input_tokens) => Ok(MessageTokensCount { input_tokens }),
            None => Err(Error::rate_limit("slow down", Some(1))),
        }
    }
}

fn thinking_reply(thinking: &str, text: &str) -> Vec<Result<MessageStreamEvent>> {
    vec![
        Ok(MessageStreamEvent::Ping),
        Ok(MessageStreamEvent::thinking_start(0)),
        Ok(MessageStreamEvent::thinking_delta(0, thinking)),
        Ok(MessageStreamEvent::block_stop(0)),
        Ok(MessageStreamEvent::text_start(1)),
        Ok(MessageStreamEvent::text_delta(1, text)),
        Ok(MessageStreamEvent::block_stop(1)),
        Ok(MessageStreamEvent::message_stop()),
    ]
}

fn renderer() -> PlainTextRenderer<Vec<u8>> {
    PlainTextRenderer::with_writer(Vec::new(), false)
}

fn output(renderer: PlainTextRenderer<Vec<u8>>) -> String {
    String::from_utf8(renderer.into_inner()).unwrap()
}

#[tokio::test]
async fn hello_turn_persists_two_messages() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path().join("conversations")).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(42)).reply(thinking_reply("reasoning...", "Hi there"));
    let conversation = store
        .create("hello", settings.model().to_string(), None)
        .unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    let mut renderer = renderer();
    let report = session.send_turn("Hello", &mut renderer).await.unwrap();
    assert_eq!(report.tokens, TokenCount::Known(42));
    assert_eq!(report.reply.visible_text, "Hi there");

    let saved = store.load("hello.json").unwrap();
    let messages = saved.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].visible_text, "Hello");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].visible_text, "Hi there");
    assert_eq!(messages[1].thinking_text.as_deref(), Some("reasoning..."));

    let echoed = output(renderer);
    assert!(echoed.contains("🧠 Thinking:\nreasoning..."));
    assert!(echoed.contains("🔮 Claude: Hi there\n"));
}

#[tokio::test]
async fn request_carries_settings_and_system_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path().join("conversations")).unwrap();
    let prompts = PromptStore::open(dir.path().join("system_prompts")).unwrap();
    prompts.create("helper", "Be helpful.").unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(7)).reply(thinking_reply("hmm", "ok"));
    let conversation = store
        .create(
            "prompted",
            settings.model().to_string(),
            Some(prompts.load("helper.txt").unwrap()),
        )
        .unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    session.send_turn("Hello", &mut renderer()).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.stream);
    assert_eq!(request.system.as_deref(), Some("Be helpful."));
    assert_eq!(request.max_tokens, 64000);
    assert_eq!(request.temperature, Some(1.0));
    assert_eq!(request.thinking, Some(settings.thinking()));
    assert_eq!(request.messages, vec![MessageParam::user("Hello")]);
}

#[tokio::test]
async fn thinking_is_never_sent_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(1))
        .reply(thinking_reply("private chain", "First answer"))
        .reply(thinking_reply("more", "Second answer"));
    let conversation = store.create("two", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    session.send_turn("one", &mut renderer()).await.unwrap();
    session.send_turn("two", &mut renderer()).await.unwrap();

    let requests = backend.requests();
    assert_eq!(
        requests[1].messages,
        vec![
            MessageParam::user("one"),
            MessageParam::assistant("First answer"),
            MessageParam::user("two"),
        ]
    );
    let body = serde_json::to_string(&requests[1]).unwrap();
    assert!(!body.contains("private chain"));
    assert_eq!(store.load("two").unwrap().messages().len(), 4);
}

#[tokio::test]
async fn aborted_stream_leaves_file_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(1))
        .reply(thinking_reply("fine", "First"))
        .reply(vec![
            Ok(MessageStreamEvent::text_start(0)),
            Ok(MessageStreamEvent::text_delta(0, "partial")),
            Err(Error::streaming("connection reset", None)),
        ]);
    let conversation = store.create("abort", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    session.send_turn("one", &mut renderer()).await.unwrap();
    let before = std::fs::read_to_string(store.path_for("abort").unwrap()).unwrap();

    let err = session.send_turn("two", &mut renderer()).await.unwrap_err();
    assert!(err.is_streaming());

    let after = std::fs::read_to_string(store.path_for("abort").unwrap()).unwrap();
    assert_eq!(before, after);
    assert_eq!(session.conversation().messages().len(), 2);
    assert_eq!(
        session.conversation().messages(),
        store.load("abort").unwrap().messages()
    );
}

#[tokio::test]
async fn truncated_or_empty_reply_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(1))
        .reply(thinking_reply("fine", "First"))
        .reply(vec![])
        .reply(vec![
            Ok(MessageStreamEvent::text_start(0)),
            Ok(MessageStreamEvent::text_delta(0, "cut off")),
        ])
        .reply(vec![
            Ok(MessageStreamEvent::thinking_start(0)),
            Ok(MessageStreamEvent::thinking_delta(0, "only thoughts")),
            Ok(MessageStreamEvent::block_stop(0)),
            Ok(MessageStreamEvent::message_stop()),
        ])
        .reply(thinking_reply("fine", "Again"));
    let conversation = store.create("dry", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    session.send_turn("one", &mut renderer()).await.unwrap();
    let before = std::fs::read_to_string(store.path_for("dry").unwrap()).unwrap();

    for _ in 0..3 {
        let err = session.send_turn("two", &mut renderer()).await.unwrap_err();
        assert!(err.is_streaming());
        let after = std::fs::read_to_string(store.path_for("dry").unwrap()).unwrap();
        assert_eq!(before, after);
        assert_eq!(session.conversation().messages().len(), 2);
    }

    session.send_turn("again", &mut renderer()).await.unwrap();
    let history: Vec<_> = backend.requests()[4]
        .messages
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(history, vec!["one", "First", "again"]);
}

#[tokio::test]
async fn failed_request_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(1));
    let conversation = store.create("empty", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    assert!(session.send_turn("Hello", &mut renderer()).await.is_err());
    assert!(session.conversation().messages().is_empty());
    assert!(store.load("empty").unwrap().messages().is_empty());
}

#[tokio::test]
async fn token_count_failure_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(None).reply(thinking_reply("x", "y"));
    let conversation = store.create("count", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    let report = session.send_turn("Hello", &mut renderer()).await.unwrap();
    assert_eq!(report.tokens, TokenCount::Unknown);
    assert_eq!(store.load("count").unwrap().messages().len(), 2);
}

#[tokio::test]
async fn run_loop_replays_and_exits() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConversationStore::open(dir.path()).unwrap();
    let settings = Settings::new("sk-test");
    let backend = ScriptedBackend::new(Some(9))
        .reply(thinking_reply("old thought", "Old answer"))
        .reply(thinking_reply("new thought", "New answer"));
    let conversation = store.create("loop", "claude-3-7-sonnet-20250219", None).unwrap();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    session.send_turn("first", &mut renderer()).await.unwrap();
    let conversation = session.into_conversation();

    let mut session = ChatSession::new(&backend, &store, &settings, conversation);
    let mut lines = VecDeque::from(vec![
        "".to_string(),
        "second".to_string(),
        "EXIT".to_string(),
        "never sent".to_string(),
    ]);
    let mut renderer = renderer();
    session.run(|_| lines.pop_front(), &mut renderer).await;

    assert_eq!(backend.requests().len(), 2);
    assert_eq!(store.load("loop").unwrap().messages().len(), 4);
    let echoed = output(renderer);
    assert!(echoed.contains("Chat session: loop"));
    assert!(echoed.contains("old thought"));
    assert!(echoed.contains("Processing..."));
    assert!(echoed.contains("Current conversation token count: 9"));
    assert_eq!(lines.len(), 1);
}
