//! Channel history retrieval with thread expansion.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::Result;
use crate::gateway::{Gateway, HistoryRequest, RepliesRequest, SlackApi, Sleeper};
use crate::model::{Channel, Message, slack_ts};

/// Every message of the thread rooted at `root_ts`, root first. The
/// retrieval window does not apply to replies.
pub async fn list_thread_replies<A: SlackApi, S: Sleeper>(
    gateway: &Gateway<A, S>,
    channel: &Channel,
    root_ts: &str,
) -> Result<Vec<Message>> {
    let mut messages = Vec::with_capacity(100);
    let mut cursor: Option<String> = None;

    loop {
        let request = RepliesRequest {
            channel_id: &channel.id,
            ts: root_ts,
            cursor: cursor.as_deref(),
        };
        let page = gateway.replies(channel, &request).await?;
        let next = page.continuation();
        messages.extend(page.items);

        match next {
            Some(next) => {
                cursor = Some(next);
                gateway.throttle().await;
            }
            None => break,
        }
    }

    debug!(channel = %channel.label(), root_ts, replies = messages.len(), "expanded thread");
    Ok(messages)
}

/// Messages posted to `channel` since `oldest`, with each threaded message
/// replaced by its whole thread.
///
/// Join, leave and broadcast messages are dropped wherever they show up, and
/// a timestamp is emitted at most once. `NotInChannel` is returned as is so
/// the caller can skip the channel.
pub async fn list_messages<A: SlackApi, S: Sleeper>(
    gateway: &Gateway<A, S>,
    channel: &Channel,
    oldest: DateTime<Utc>,
) -> Result<Vec<Message>> {
    let oldest_ts = slack_ts(oldest);
    let mut flattened = Flattened::default();
    let mut cursor: Option<String> = None;

    loop {
        let request = HistoryRequest {
            channel_id: &channel.id,
            oldest: &oldest_ts,
            cursor: cursor.as_deref(),
        };
        let page = gateway.history(channel, &request).await?;
        let next = page.continuation();

        for message in page.items {
            if message.is_excluded_subtype() {
                continue;
            }
            if message.has_replies() {
                gateway.throttle().await;
                let thread = list_thread_replies(gateway, channel, &message.ts).await?;
                flattened.extend(thread);
            } else {
                flattened.push(message);
            }
        }

        match next {
            Some(next) => {
                cursor = Some(next);
                gateway.throttle().await;
            }
            None => break,
        }
    }

    Ok(flattened.messages)
}

#[derive(Default)]
struct Flattened {
    messages: Vec<Message>,
    seen: HashSet<String>,
}

impl Flattened {
    fn push(&mut self, message: Message) {
        if message.is_excluded_subtype() || !self.seen.insert(message.ts.clone()) {
            return;
        }
        self.messages.push(message);
    }

    fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.push(message);
        }
    }
}
