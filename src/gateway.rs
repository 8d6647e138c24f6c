//! Rate-limited access to the Slack Web API.
//!
//! [`SlackApi`] is the raw client seam: one call, one page, errors as the
//! platform reported them. [`Gateway`] wraps it with the retrieval contract:
//! a rate-limited call sleeps for the server supplied retry-after and is
//! re-issued unchanged, as many times as needed, and a `not_in_channel`
//! failure is reclassified as [`AppError::NotInChannel`].

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::model::{Channel, Message, Page, User};
use crate::{AppError, Result};

/// Slack error code returned when the bot is not a member of the channel.
pub const NOT_IN_CHANNEL: &str = "not_in_channel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryRequest<'a> {
    pub channel_id: &'a str,
    /// Lower bound, as a Slack timestamp.
    pub oldest: &'a str,
    pub cursor: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepliesRequest<'a> {
    pub channel_id: &'a str,
    /// Timestamp of the thread's root message.
    pub ts: &'a str,
    pub cursor: Option<&'a str>,
}

pub trait SlackApi {
    /// Identity behind the token. Fails when the token is rejected.
    fn auth_test(&self) -> impl Future<Output = Result<String>> + Send;

    /// One page of non-archived public channels.
    fn conversations_page(&self, cursor: Option<&str>) -> impl Future<Output = Result<Page<Channel>>> + Send;

    fn history_page(&self, request: &HistoryRequest<'_>) -> impl Future<Output = Result<Page<Message>>> + Send;

    fn replies_page(&self, request: &RepliesRequest<'_>) -> impl Future<Output = Result<Page<Message>>> + Send;

    fn users_page(&self, cursor: Option<&str>) -> impl Future<Output = Result<Page<User>>> + Send;

    /// Custom emoji name to image URL (or `alias:<name>`).
    fn emoji_list(&self) -> impl Future<Output = Result<BTreeMap<String, String>>> + Send;
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct Gateway<A, S> {
    api: A,
    sleeper: S,
    throttle: Duration,
}

impl<A: SlackApi, S: Sleeper> Gateway<A, S> {
    pub fn new(api: A, sleeper: S, throttle: Duration) -> Self {
        Self {
            api,
            sleeper,
            throttle,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Fixed pause between consecutive page requests.
    pub async fn throttle(&self) {
        self.sleeper.sleep(self.throttle).await;
    }

    /// Issues `call` until it stops being rate limited. `channel` only labels
    /// log lines and the not-in-channel error.
    pub async fn fetch_page<T, F, Fut>(&self, channel: Option<&Channel>, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let label = channel.map(Channel::label).unwrap_or_default();
        loop {
            match call().await {
                Err(AppError::SlackRateLimit { retry_after_secs }) => {
                    warn!(channel = %label, retry_after_secs, "rate limited, waiting before retry");
                    self.sleeper.sleep(Duration::from_secs(retry_after_secs)).await;
                }
                Err(AppError::SlackApi(code)) if code == NOT_IN_CHANNEL => {
                    return Err(AppError::NotInChannel {
                        channel: channel.map(|c| c.name.clone()).unwrap_or_default(),
                    });
                }
                other => return other,
            }
        }
    }

    pub async fn auth_test(&self) -> Result<String> {
        self.fetch_page(None, move || self.api.auth_test()).await
    }

    pub async fn channels(&self, cursor: Option<&str>) -> Result<Page<Channel>> {
        self.fetch_page(None, move || self.api.conversations_page(cursor)).await
    }

    pub async fn history(&self, channel: &Channel, request: &HistoryRequest<'_>) -> Result<Page<Message>> {
        self.fetch_page(Some(channel), move || self.api.history_page(request)).await
    }

    pub async fn replies(&self, channel: &Channel, request: &RepliesRequest<'_>) -> Result<Page<Message>> {
        self.fetch_page(Some(channel), move || self.api.replies_page(request)).await
    }

    pub async fn users(&self, cursor: Option<&str>) -> Result<Page<User>> {
        self.fetch_page(None, move || self.api.users_page(cursor)).await
    }

    pub async fn emoji_list(&self) -> Result<BTreeMap<String, String>> {
        self.fetch_page(None, move || self.api.emoji_list()).await
    }

    /// Every workspace member, following the cursor to the end.
    pub async fn all_users(&self) -> Result<Vec<User>> {
        let mut all_users = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.users(cursor.as_deref()).await?;
            let next = page.continuation();
            all_users.extend(page.items);

            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all_users)
    }
}
