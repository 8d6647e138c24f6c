//! Per-channel download loop.
//!
//! Channels are visited in catalog order, one at a time. A channel whose
//! artifact file exists is considered done, so an interrupted run picks up
//! at the first channel without one.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::Result;
use crate::gateway::{Gateway, SlackApi, Sleeper};
use crate::history::list_messages;
use crate::model::{Channel, Message};
use crate::store::ArtifactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    Archived,
    AlreadyDone,
    Saved { messages: usize },
    SkippedNotInChannel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrievalReport {
    pub saved: usize,
    pub archived: usize,
    pub already_done: usize,
    pub not_in_channel: usize,
    pub messages: usize,
}

impl RetrievalReport {
    fn record(&mut self, outcome: ChannelOutcome) {
        match outcome {
            ChannelOutcome::Archived => self.archived += 1,
            ChannelOutcome::AlreadyDone => self.already_done += 1,
            ChannelOutcome::SkippedNotInChannel => self.not_in_channel += 1,
            ChannelOutcome::Saved { messages } => {
                self.saved += 1;
                self.messages += messages;
            }
        }
    }
}

pub struct Retriever<'a, A, S> {
    gateway: &'a Gateway<A, S>,
    store: &'a ArtifactStore,
    oldest: DateTime<Utc>,
}

impl<'a, A: SlackApi, S: Sleeper> Retriever<'a, A, S> {
    /// `oldest` bounds every channel's history and is fixed for the whole run.
    pub fn new(gateway: &'a Gateway<A, S>, store: &'a ArtifactStore, oldest: DateTime<Utc>) -> Self {
        Self {
            gateway,
            store,
            oldest,
        }
    }

    /// Stops at the first error other than not-in-channel. Artifacts written
    /// before that point are kept.
    pub async fn run(&self, channels: &[Channel]) -> Result<RetrievalReport> {
        let mut report = RetrievalReport::default();

        for channel in channels {
            let outcome = self.retrieve_channel(channel).await?;
            report.record(outcome);
        }

        info!(
            saved = report.saved,
            archived = report.archived,
            already_done = report.already_done,
            not_in_channel = report.not_in_channel,
            messages = report.messages,
            "retrieval finished"
        );
        Ok(report)
    }

    pub async fn retrieve_channel(&self, channel: &Channel) -> Result<ChannelOutcome> {
        let label = channel.label();

        if channel.is_archived {
            info!(channel = %label, "skipped archived channel");
            return Ok(ChannelOutcome::Archived);
        }

        if self.store.exists(channel) {
            info!(channel = %label, "already saved");
            return Ok(ChannelOutcome::AlreadyDone);
        }

        let messages = match list_messages(self.gateway, channel, self.oldest).await {
            Ok(messages) => messages,
            Err(e) if e.is_not_in_channel() => {
                error!(channel = %label, "not in channel");
                return Ok(ChannelOutcome::SkippedNotInChannel);
            }
            Err(e) => return Err(e),
        };

        info!(channel = %label, "fetched {} messages", messages.len());
        let messages = strip_blocks(messages);
        self.store.save(channel, &messages)?;

        Ok(ChannelOutcome::Saved {
            messages: messages.len(),
        })
    }
}

/// Clears the block kit payload, which is large and unused by the reports.
pub fn strip_blocks(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .map(|mut message| {
            message.blocks = None;
            message
        })
        .collect()
}
