use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;
use crate::model::Message;
use crate::store::{ArtifactStore, write_json};

pub const TOP_POPULAR: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularMessage {
    pub msg: Message,
    pub count: u64,
}

/// The `limit` messages with the most reactions, most reacted first. Ties
/// keep corpus order.
pub fn rank_popular(messages: Vec<Message>, limit: usize) -> Vec<PopularMessage> {
    let mut ranked: Vec<PopularMessage> = messages
        .into_iter()
        .map(|msg| PopularMessage {
            count: msg.total_reactions(),
            msg,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

pub fn run_popular(store: &ArtifactStore, output: &Path) -> Result<usize> {
    let popular = rank_popular(store.load_all()?, TOP_POPULAR);
    for entry in &popular {
        info!(ts = %entry.msg.ts, count = entry.count, "popular message");
    }
    write_json(output, &popular)?;
    Ok(popular.len())
}
