//! Usage counts for every custom emoji, plus the ones nobody used.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::emoji::{count_raw_emojis, is_valid_emoji_name};
use crate::model::Message;
use crate::normalize::normalize_keys;
use crate::store::{ArtifactStore, read_json, write_json};
use crate::{AppError, Result};

/// Letter tiles are used to spell words and are not ranked.
const SPELLING_PREFIX: &str = "alphabet-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiUsage {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub link: String,
    pub is_custom: bool,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaleReport {
    pub all: Vec<EmojiUsage>,
    pub unused: Vec<EmojiUsage>,
}

/// Custom emoji from the saved `emojis.list` map, sorted by name. Fails on
/// the first name without a single shortcode character.
pub fn load_custom_emojis(path: &Path) -> Result<Vec<EmojiUsage>> {
    let catalog: BTreeMap<String, String> = read_json(path)?;

    let mut custom = Vec::new();
    for (name, link) in normalize_keys(catalog) {
        if name.starts_with(SPELLING_PREFIX) {
            continue;
        }
        if !is_valid_emoji_name(&name) {
            return Err(AppError::InvalidEmojiName(name));
        }
        custom.push(EmojiUsage {
            name,
            link,
            is_custom: true,
            count: 0,
        });
    }
    Ok(custom)
}

/// Total uses per emoji across the corpus.
pub fn count_usage(messages: &[Message]) -> BTreeMap<String, u64> {
    let mut counter = BTreeMap::new();
    for message in messages {
        for (name, count) in count_raw_emojis(message) {
            *counter.entry(name).or_insert(0) += count;
        }
    }
    counter
}

/// Every used emoji plus every custom one, most used first. `unused` holds
/// the customs with no use, by name.
pub fn build_stale_report(custom: Vec<EmojiUsage>, mut counter: BTreeMap<String, u64>) -> StaleReport {
    let mut all: Vec<EmojiUsage> = Vec::new();
    let mut unused: Vec<EmojiUsage> = Vec::new();

    for mut emoji in custom {
        emoji.count = counter.remove(&emoji.name).unwrap_or(0);
        if emoji.count == 0 {
            unused.push(emoji.clone());
        }
        all.push(emoji);
    }

    all.extend(counter.into_iter().map(|(name, count)| EmojiUsage {
        name,
        link: String::new(),
        is_custom: false,
        count,
    }));

    all.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    unused.sort_by(|a, b| a.name.cmp(&b.name));

    StaleReport { all, unused }
}

/// Used names that are neither custom nor a standard shortcode, usually
/// emoji that were deleted from the workspace.
pub fn unknown_names(report: &StaleReport) -> Vec<&str> {
    report
        .all
        .iter()
        .filter(|e| !e.is_custom && emojis::get_by_shortcode(&e.name).is_none())
        .map(|e| e.name.as_str())
        .collect()
}

pub fn run_stale(
    store: &ArtifactStore,
    emojis_path: &Path,
    all_output: &Path,
    unused_output: &Path,
) -> Result<StaleReport> {
    let custom = load_custom_emojis(emojis_path)?;
    let counter = count_usage(&store.load_all()?);
    let report = build_stale_report(custom, counter);

    let unknown = unknown_names(&report);
    if !unknown.is_empty() {
        debug!(names = ?unknown, "emoji neither custom nor standard");
    }
    info!(
        emojis = report.all.len(),
        unused = report.unused.len(),
        unknown = unknown.len(),
        "emoji usage counted"
    );

    write_json(all_output, &report.all)?;
    write_json(unused_output, &report.unused)?;
    Ok(report)
}
