//! Scripted stand-ins for the Slack client and the sleeper.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::gateway::{HistoryRequest, RepliesRequest, SlackApi, Sleeper};
use crate::model::{Channel, Message, Page, User, UserProfile};
use crate::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Auth,
    Channels {
        cursor: Option<String>,
    },
    History {
        channel_id: String,
        oldest: String,
        cursor: Option<String>,
    },
    Replies {
        channel_id: String,
        ts: String,
        cursor: Option<String>,
    },
    Users {
        cursor: Option<String>,
    },
    Emoji,
}

/// Answers each request with the next scripted response for that endpoint.
/// An exhausted script answers with an error, so surplus requests show up
/// both in `calls()` and as a failure.
#[derive(Default)]
pub struct ScriptedApi {
    auth: Mutex<VecDeque<Result<String>>>,
    channels: Mutex<VecDeque<Result<Page<Channel>>>>,
    history: Mutex<HashMap<String, VecDeque<Result<Page<Message>>>>>,
    replies: Mutex<HashMap<(String, String), VecDeque<Result<Page<Message>>>>>,
    users: Mutex<VecDeque<Result<Page<User>>>>,
    emojis: Mutex<Option<BTreeMap<String, String>>>,
    calls: Mutex<Vec<Call>>,
}

fn unscripted(what: &str) -> AppError {
    AppError::SlackApi(format!("unscripted request: {}", what))
}

impl ScriptedApi {
    pub fn push_auth(&self, response: Result<String>) {
        self.auth.lock().unwrap().push_back(response);
    }

    pub fn push_channels(&self, response: Result<Page<Channel>>) {
        self.channels.lock().unwrap().push_back(response);
    }

    pub fn push_history(&self, channel_id: &str, response: Result<Page<Message>>) {
        self.history
            .lock()
            .unwrap()
            .entry(channel_id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn push_replies(&self, channel_id: &str, ts: &str, response: Result<Page<Message>>) {
        self.replies
            .lock()
            .unwrap()
            .entry((channel_id.to_string(), ts.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn push_users(&self, response: Result<Page<User>>) {
        self.users.lock().unwrap().push_back(response);
    }

    pub fn set_emojis(&self, emojis: BTreeMap<String, String>) {
        *self.emojis.lock().unwrap() = Some(emojis);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn history_calls(&self, channel_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::History { channel_id: id, .. } if id == channel_id))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SlackApi for ScriptedApi {
    async fn auth_test(&self) -> Result<String> {
        self.record(Call::Auth);
        self.auth
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("U0BOT".to_string()))
    }

    async fn conversations_page(&self, cursor: Option<&str>) -> Result<Page<Channel>> {
        self.record(Call::Channels {
            cursor: cursor.map(str::to_string),
        });
        self.channels
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("conversations.list")))
    }

    async fn history_page(&self, request: &HistoryRequest<'_>) -> Result<Page<Message>> {
        self.record(Call::History {
            channel_id: request.channel_id.to_string(),
            oldest: request.oldest.to_string(),
            cursor: request.cursor.map(str::to_string),
        });
        self.history
            .lock()
            .unwrap()
            .get_mut(request.channel_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(unscripted("conversations.history")))
    }

    async fn replies_page(&self, request: &RepliesRequest<'_>) -> Result<Page<Message>> {
        self.record(Call::Replies {
            channel_id: request.channel_id.to_string(),
            ts: request.ts.to_string(),
            cursor: request.cursor.map(str::to_string),
        });
        self.replies
            .lock()
            .unwrap()
            .get_mut(&(request.channel_id.to_string(), request.ts.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(unscripted("conversations.replies")))
    }

    async fn users_page(&self, cursor: Option<&str>) -> Result<Page<User>> {
        self.record(Call::Users {
            cursor: cursor.map(str::to_string),
        });
        self.users
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("users.list")))
    }

    async fn emoji_list(&self) -> Result<BTreeMap<String, String>> {
        self.record(Call::Emoji);
        self.emojis
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unscripted("emoji.list"))
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub fn message(ts: &str) -> Message {
    let mut message = Message::new(ts, format!("message {}", ts));
    message.user = Some("U1".to_string());
    message
}

pub fn threaded(ts: &str, reply_count: u64) -> Message {
    let mut message = message(ts);
    message.reply_count = reply_count;
    message
}

pub fn with_subtype(ts: &str, subtype: &str) -> Message {
    let mut message = message(ts);
    message.subtype = Some(subtype.to_string());
    message
}

/// A page whose `has_more` flag follows the presence of `next`.
pub fn history_page(items: Vec<Message>, next: Option<&str>) -> Page<Message> {
    Page::new(items, next.map(str::to_string), next.is_some())
}

pub fn channel_page(items: Vec<Channel>, next: Option<&str>) -> Page<Channel> {
    Page::new(items, next.map(str::to_string), next.is_some())
}

pub fn archived(id: &str, name: &str) -> Channel {
    let mut channel = Channel::new(id, name);
    channel.is_archived = true;
    channel
}

pub fn user(id: &str, real_name: &str) -> User {
    User {
        id: id.to_string(),
        real_name: Some(real_name.to_string()),
        is_bot: false,
        profile: Some(UserProfile {
            real_name: Some(real_name.to_string()),
            image_192: Some(format!("https://img/{}.png", id)),
        }),
    }
}
