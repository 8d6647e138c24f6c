use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("SLACK_BOT_TOKEN environment variable not set")]
    MissingToken,

    #[error("Slack authentication failed: {0}")]
    Auth(String),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Slack rate limit error: retry after {retry_after_secs}s")]
    SlackRateLimit { retry_after_secs: u64 },

    #[error("not in channel #{channel}")]
    NotInChannel { channel: String },

    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write file at {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    JsonSerialize(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("'{0}' does not match the emoji name pattern")]
    InvalidEmojiName(String),
}

impl AppError {
    /// True for the error a channel fetch reports when the bot was never invited.
    pub fn is_not_in_channel(&self) -> bool {
        matches!(self, AppError::NotInChannel { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
