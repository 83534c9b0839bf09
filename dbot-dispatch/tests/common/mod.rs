//! Shared helpers: a recording mock bot, update builders and a log capture layer.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use dbot_core::{Bot, Chat, Message, Update, User};
use dbot_dispatch::{Application, Callback, Flow};
use parking_lot::Mutex;
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event as TracingEvent, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const BOT_USERNAME: &str = "Foo";
pub const USER_ID: i64 = 42;
pub const CHAT_ID: i64 = -100;

/// Bot that records outgoing texts instead of calling the Bot API.
#[derive(Default)]
pub struct MockBot {
    pub username: Option<String>,
    pub sent: Mutex<Vec<(i64, String)>>,
}

impl MockBot {
    pub fn named(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, text)| text.clone()).collect()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn get_me(&self) -> dbot_core::Result<User> {
        let mut me = User::new(1, "Mock");
        me.is_bot = true;
        me.username = self.username.clone();
        Ok(me)
    }

    async fn send_message(&self, chat: &Chat, text: &str) -> dbot_core::Result<()> {
        self.sent.lock().push((chat.id, text.to_string()));
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> dbot_core::Result<()> {
        self.sent.lock().push((message.chat.id, text.to_string()));
        Ok(())
    }

    async fn answer_callback_query(&self, _id: &str, text: Option<&str>) -> dbot_core::Result<()> {
        self.sent.lock().push((0, text.unwrap_or_default().to_string()));
        Ok(())
    }
}

/// Application with a mock bot named [`BOT_USERNAME`], not yet initialized.
pub fn app() -> (Application, Arc<MockBot>) {
    app_with_concurrency(1)
}

pub fn app_with_concurrency(concurrent_updates: usize) -> (Application, Arc<MockBot>) {
    let bot = Arc::new(MockBot::named(BOT_USERNAME));
    let app = Application::builder()
        .bot(bot.clone())
        .bot_username(BOT_USERNAME)
        .concurrent_updates(concurrent_updates)
        .build()
        .expect("build application");
    (app, bot)
}

fn message_json(text: &str) -> serde_json::Value {
    let mut message = json!({
        "message_id": 1,
        "date": 1_700_000_000,
        "from": {"id": USER_ID, "is_bot": false, "first_name": "Ann"},
        "chat": {"id": CHAT_ID, "type": "group", "title": "Test"},
        "text": text,
    });
    if text.starts_with('/') {
        let command_len = text
            .split_whitespace()
            .next()
            .map_or(0, |t| t.encode_utf16().count());
        message["entities"] = json!([{"type": "bot_command", "offset": 0, "length": command_len}]);
    }
    message
}

/// A new message; text starting with `/` gets a bot command entity.
pub fn text_update(update_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({"update_id": update_id, "message": message_json(text)}))
        .expect("message update")
}

pub fn edited_update(update_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({"update_id": update_id, "edited_message": message_json(text)}))
        .expect("edited message update")
}

pub fn callback_update(update_id: i64, data: Option<&str>) -> Update {
    let mut query = json!({
        "id": "cq1",
        "from": {"id": USER_ID, "is_bot": false, "first_name": "Ann"},
        "chat_instance": "ci",
        "message": message_json("menu"),
    });
    if let Some(data) = data {
        query["data"] = json!(data);
    }
    serde_json::from_value(json!({"update_id": update_id, "callback_query": query}))
        .expect("callback query update")
}

pub fn inline_update(update_id: i64, query: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "inline_query": {
            "id": "iq1",
            "from": {"id": USER_ID, "is_bot": false, "first_name": "Ann"},
            "query": query,
            "offset": "",
            "chat_type": "private"
        }
    }))
    .expect("inline query update")
}

pub fn chat_member_update(update_id: i64, field: &str, chat_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        field: {
            "chat": {"id": chat_id, "type": "supergroup"},
            "from": {"id": USER_ID, "is_bot": false, "first_name": "Ann"},
            "date": 1_700_000_000,
            "old_chat_member": {"user": {"id": 1, "is_bot": true, "first_name": "Mock"}, "status": "left"},
            "new_chat_member": {"user": {"id": 1, "is_bot": true, "first_name": "Mock"}, "status": "member"}
        }
    }))
    .expect("chat member update")
}

pub fn poll_update(update_id: i64) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "poll": {
            "id": "p1",
            "question": "?",
            "options": [{"text": "a", "voter_count": 1}],
            "total_voter_count": 1,
            "is_closed": false,
            "is_anonymous": true,
            "type": "regular"
        }
    }))
    .expect("poll update")
}

/// Ordered record of which callbacks ran.
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(calls: &Calls) -> Vec<String> {
    calls.lock().clone()
}

/// Callback that appends `label` and returns `flow`.
pub fn recording(calls: &Calls, label: &str, flow: Flow) -> Callback {
    let calls = calls.clone();
    let label = label.to_string();
    Callback::new(move |_, _| {
        calls.lock().push(label.clone());
        let flow = flow.clone();
        async move { Ok(flow) }
    })
}

/// Callback that appends `label` and fails.
pub fn failing(calls: &Calls, label: &str) -> Callback {
    let calls = calls.clone();
    let label = label.to_string();
    Callback::new(move |_, _| {
        calls.lock().push(label.clone());
        let message = format!("{label} failed");
        async move { Err(anyhow::anyhow!(message)) }
    })
}

/// Captures `(level, message)` of every event emitted on the current thread while the
/// returned guard lives. Pair with current-thread `#[tokio::test]`s so spawned tasks log
/// through it too.
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

impl LogCapture {
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contains(&self, level: Level, message: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(message))
    }

    pub fn count(&self, level: Level, message: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|(l, m)| *l == level && m.contains(message))
            .count()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &TracingEvent<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.records.lock().push((*event.metadata().level(), visitor.0));
    }
}
