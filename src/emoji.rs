use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Message, Reaction};
use crate::normalize::{normalize, remove_skin_tone};

/// `:name:` shortcodes in message text.
#[allow(clippy::expect_used)]
static EMOJI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([가-힣a-zA-Z0-9_+\-]+):").expect("valid emoji regex"));

/// Shortcode characters anywhere in a custom emoji name.
#[allow(clippy::expect_used)]
static EMOJI_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[가-힣a-zA-Z0-9_+\-]+").expect("valid emoji name regex"));

/// `text` with every `:name:` shortcode removed.
pub fn remove_emojis(text: &str) -> Cow<'_, str> {
    EMOJI_PATTERN.replace_all(text, "")
}

/// True when `name` has at least one shortcode character. Names mixing in
/// other scripts or punctuation still pass.
pub fn is_valid_emoji_name(name: &str) -> bool {
    EMOJI_NAME_PATTERN.is_match(name)
}

/// Emoji names in `text`, in order of appearance. Skin tone modifiers
/// (`:pray::skin-tone-2:`) are dropped so only the base emoji counts.
pub fn extract_emojis_from_text(text: &str) -> Vec<String> {
    EMOJI_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| normalize(m.as_str()))
        .filter(|name| !name.starts_with("skin-tone-"))
        .collect()
}

/// Normalized reaction name without its skin tone.
pub fn reaction_name(reaction: &Reaction) -> String {
    remove_skin_tone(&normalize(&reaction.name)).to_string()
}

/// Uses per emoji in one message: one per shortcode in the text plus every
/// reaction count.
pub fn count_raw_emojis(message: &Message) -> BTreeMap<String, u64> {
    let mut counter = BTreeMap::new();
    for name in extract_emojis_from_text(&message.text) {
        *counter.entry(name).or_insert(0) += 1;
    }
    for reaction in &message.reactions {
        *counter.entry(reaction_name(reaction)).or_insert(0) += reaction.count;
    }
    counter
}
