//! Longest human-written messages, after markup that inflates length is
//! stripped out.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::Result;
use crate::emoji::remove_emojis;
use crate::model::Message;
use crate::store::{ArtifactStore, write_json};

pub const MIN_LENGTH: usize = 1000;
const MIN_ALPHABET_PERCENT: usize = 40;
const MIN_UPPERCASE_PERCENT: usize = 20;
const MIN_DIGIT_PERCENT: usize = 20;

#[allow(clippy::expect_used)]
static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid code block regex"));

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^|\s]+").expect("valid url regex"));

#[allow(clippy::expect_used)]
static DECIMAL_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Nd}").expect("valid digit regex"));

/// `<@U123>`, `<#C123|name>`, `<!subteam^S123|@group>`
#[allow(clippy::expect_used)]
static SLACK_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(@|!subteam\^|#)([A-Z0-9]+)(>|\|[^>]+>)").expect("valid reference regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongMessage {
    pub text: String,
    pub length: usize,
}

/// Character counts of a stripped text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TextShape {
    length: usize,
    alphabet: usize,
    uppercase: usize,
    digits: usize,
}

impl TextShape {
    fn of(text: &str) -> Self {
        let digits = DECIMAL_DIGIT.find_iter(text).count();
        text.chars().fold(Self { digits, ..Self::default() }, |mut shape, c| {
            shape.length += 1;
            if c.is_ascii_alphabetic() {
                shape.alphabet += 1;
            }
            if c.is_uppercase() {
                shape.uppercase += 1;
            }
            shape
        })
    }

    fn percent(&self, count: usize) -> usize {
        if self.length == 0 {
            return 0;
        }
        count * 100 / self.length
    }

    /// Reason the text looks machine generated, if it does.
    fn rejection(&self) -> Option<&'static str> {
        if self.percent(self.alphabet) >= MIN_ALPHABET_PERCENT {
            Some("mostly latin letters")
        } else if self.percent(self.uppercase) >= MIN_UPPERCASE_PERCENT {
            Some("mostly uppercase")
        } else if self.percent(self.digits) >= MIN_DIGIT_PERCENT {
            Some("mostly digits")
        } else {
            None
        }
    }
}

/// Code blocks, links, mentions and emoji shortcodes removed.
pub fn strip_markup(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, "");
    let text = URL.replace_all(&text, "");
    let text = SLACK_REFERENCE.replace_all(&text, "");
    remove_emojis(&text).into_owned()
}

/// Messages whose stripped text is at least [`MIN_LENGTH`] characters,
/// longest first. Bot posts and texts dominated by latin letters, capitals
/// or digits are dropped.
pub fn rank_longest(messages: &[Message]) -> Vec<LongMessage> {
    let mut longest: Vec<LongMessage> = messages
        .iter()
        .filter_map(|message| {
            let text = strip_markup(&message.text);
            let shape = TextShape::of(&text);
            if shape.length < MIN_LENGTH {
                return None;
            }
            if message.subtype() == "bot_message" {
                warn!(ts = %message.ts, "dropped bot message");
                return None;
            }
            if let Some(reason) = shape.rejection() {
                warn!(ts = %message.ts, reason, "dropped long message");
                return None;
            }
            Some(LongMessage {
                text,
                length: shape.length,
            })
        })
        .collect();

    longest.sort_by(|a, b| b.length.cmp(&a.length));
    longest
}

pub fn run_longest(store: &ArtifactStore, output: &Path) -> Result<usize> {
    let longest = rank_longest(&store.load_all()?);
    info!("{} messages of {} characters or more", longest.len(), MIN_LENGTH);
    write_json(output, &longest)?;
    Ok(longest.len())
}
