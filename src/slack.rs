//! [`SlackApi`] over the Slack Web API, backed by slack-morphism.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use slack_morphism::errors::SlackClientError;
use slack_morphism::prelude::*;

use crate::gateway::{HistoryRequest, RepliesRequest, SlackApi};
use crate::model::{Channel, Message, Page, User};
use crate::{AppError, Result};

/// Wait applied when a rate-limited response carries no Retry-After header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

pub struct SlackMorphismApi {
    client: SlackHyperClient,
    token: SlackApiToken,
    page_limit: u16,
}

impl SlackMorphismApi {
    pub fn new(token: &str, page_limit: u16) -> Result<Self> {
        // Another crate may already have installed a provider; either one works.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let connector = SlackClientHyperConnector::new().map_err(|e| AppError::SlackApi(e.to_string()))?;
        Ok(Self {
            client: SlackClient::new(connector),
            token: SlackApiToken::new(SlackApiTokenValue(token.to_string())),
            page_limit,
        })
    }
}

fn map_client_error(err: SlackClientError) -> AppError {
    match err {
        SlackClientError::RateLimitError(e) => AppError::SlackRateLimit {
            retry_after_secs: e
                .retry_after
                .map(|d| d.as_secs())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        SlackClientError::ApiError(e) => AppError::SlackApi(e.code),
        other => AppError::SlackApi(other.to_string()),
    }
}

/// Re-reads a slack-morphism record through its wire JSON.
fn convert<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U> {
    serde_json::to_value(value)
        .and_then(serde_json::from_value)
        .map_err(|e| AppError::JsonParse(e.to_string()))
}

fn convert_all<T: Serialize, U: DeserializeOwned>(values: &[T]) -> Result<Vec<U>> {
    values.iter().map(convert).collect()
}

fn next_cursor(metadata: Option<SlackResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.next_cursor)
        .map(|c| c.0)
        .filter(|c| !c.is_empty())
}

fn opt_cursor(cursor: Option<&str>) -> Option<SlackCursorId> {
    cursor.map(|c| SlackCursorId(c.to_string()))
}

impl SlackApi for SlackMorphismApi {
    async fn auth_test(&self) -> Result<String> {
        let session = self.client.open_session(&self.token);
        let response = session.auth_test().await.map_err(|e| match e {
            SlackClientError::ApiError(e) => AppError::Auth(e.code),
            other => map_client_error(other),
        })?;

        let value = serde_json::to_value(&response).map_err(|e| AppError::JsonParse(e.to_string()))?;
        Ok(value
            .get("user_id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn conversations_page(&self, cursor: Option<&str>) -> Result<Page<Channel>> {
        let session = self.client.open_session(&self.token);
        let request = SlackApiConversationsListRequest::new()
            .with_limit(self.page_limit)
            .with_types(vec![SlackConversationType::Public])
            .with_exclude_archived(true)
            .opt_cursor(opt_cursor(cursor));

        let response = session
            .conversations_list(&request)
            .await
            .map_err(map_client_error)?;

        let next = next_cursor(response.response_metadata);
        let has_more = next.is_some();
        Ok(Page::new(convert_all(&response.channels)?, next, has_more))
    }

    async fn history_page(&self, request: &HistoryRequest<'_>) -> Result<Page<Message>> {
        let session = self.client.open_session(&self.token);
        let api_request = SlackApiConversationsHistoryRequest::new()
            .with_channel(SlackChannelId(request.channel_id.to_string()))
            .with_oldest(SlackTs(request.oldest.to_string()))
            .with_limit(self.page_limit)
            .opt_cursor(opt_cursor(request.cursor));

        let response = session
            .conversations_history(&api_request)
            .await
            .map_err(map_client_error)?;

        let next = next_cursor(response.response_metadata);
        let has_more = response.has_more.unwrap_or(next.is_some());
        Ok(Page::new(convert_all(&response.messages)?, next, has_more))
    }

    async fn replies_page(&self, request: &RepliesRequest<'_>) -> Result<Page<Message>> {
        let session = self.client.open_session(&self.token);
        let api_request = SlackApiConversationsRepliesRequest::new(
            SlackChannelId(request.channel_id.to_string()),
            SlackTs(request.ts.to_string()),
        )
        .with_limit(self.page_limit)
        .opt_cursor(opt_cursor(request.cursor));

        let response = session
            .conversations_replies(&api_request)
            .await
            .map_err(map_client_error)?;

        let next = next_cursor(response.response_metadata);
        let has_more = response.has_more.unwrap_or(next.is_some());
        Ok(Page::new(convert_all(&response.messages)?, next, has_more))
    }

    async fn users_page(&self, cursor: Option<&str>) -> Result<Page<User>> {
        let session = self.client.open_session(&self.token);
        let request = SlackApiUsersListRequest::new()
            .with_limit(self.page_limit)
            .opt_cursor(opt_cursor(cursor));

        let response = session.users_list(&request).await.map_err(map_client_error)?;

        let next = next_cursor(response.response_metadata);
        let has_more = next.is_some();
        Ok(Page::new(convert_all(&response.members)?, next, has_more))
    }

    async fn emoji_list(&self) -> Result<BTreeMap<String, String>> {
        let session = self.client.open_session(&self.token);
        let response = session.emoji_list().await.map_err(map_client_error)?;

        Ok(response
            .emoji
            .into_iter()
            .map(|(name, emoji)| {
                let target = match emoji {
                    SlackEmojiRef::Url(url) => url.to_string(),
                    SlackEmojiRef::Alias(alias) => format!("alias:{}", alias.0),
                };
                (name.0, target)
            })
            .collect())
    }
}
