//! Domain records shared by the retrieval pipeline and the reports.
//!
//! Records keep the Slack wire field names so catalog and artifact files stay
//! readable by other Slack tooling. Upstream fields this crate does not model
//! are carried through `extra` untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Subtypes that never reach a per-channel artifact.
pub const EXCLUDED_SUBTYPES: [&str; 3] = ["channel_join", "channel_leave", "thread_broadcast"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_archived: false,
            extra: Map::new(),
        }
    }

    /// Channel name as it appears in log lines.
    pub fn label(&self) -> String {
        format!("#{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub reply_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
    /// Block kit rendering of the text. Large, and cleared before persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl Message {
    pub fn new(ts: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: None,
            bot_id: None,
            text: text.into(),
            ts: ts.into(),
            subtype: None,
            reply_count: 0,
            reactions: Vec::new(),
            blocks: None,
            extra: Map::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or_default()
    }

    pub fn subtype(&self) -> &str {
        self.subtype.as_deref().unwrap_or_default()
    }

    pub fn has_replies(&self) -> bool {
        self.reply_count > 0
    }

    pub fn is_excluded_subtype(&self) -> bool {
        EXCLUDED_SUBTYPES.contains(&self.subtype())
    }

    /// Written by a person: has an author and no bot id.
    pub fn is_human(&self) -> bool {
        !self.user_id().is_empty() && self.bot_id.as_deref().unwrap_or_default().is_empty()
    }

    pub fn total_reactions(&self) -> u64 {
        self.reactions.iter().map(|r| r.count).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub image_192: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl User {
    pub fn real_name(&self) -> &str {
        self.real_name
            .as_deref()
            .or_else(|| self.profile.as_ref().and_then(|p| p.real_name.as_deref()))
            .unwrap_or_default()
    }

    pub fn image(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.image_192.as_deref())
            .unwrap_or_default()
    }
}

/// One response of a cursor-paginated Slack method.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    /// Cursor for the following request, or `None` when this page is the last.
    pub fn continuation(&self) -> Option<String> {
        if !self.has_more {
            return None;
        }
        self.next_cursor.clone().filter(|c| !c.is_empty())
    }
}

/// Slack timestamp (`seconds.micros`) for an instant.
pub fn slack_ts(time: DateTime<Utc>) -> String {
    format!("{}.000000", time.timestamp())
}
