use std::io;
use std::path::Path;

use tracing::info;

use crate::gateway::{Gateway, SlackApi, Sleeper};
use crate::model::Channel;
use crate::store::{read_json, write_json};
use crate::{AppError, Result};

/// Every non-archived public channel, following the cursor to the end.
pub async fn list_channels<A: SlackApi, S: Sleeper>(gateway: &Gateway<A, S>) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = gateway.channels(cursor.as_deref()).await?;
        let next = page.continuation();
        channels.extend(page.items.into_iter().filter(|c| !c.is_archived));

        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(channels)
}

/// Loads the channel snapshot at `path`, creating it from the API when the
/// file does not exist yet. An existing snapshot is used as is.
pub async fn load_channels<A: SlackApi, S: Sleeper>(
    gateway: &Gateway<A, S>,
    path: &Path,
) -> Result<Vec<Channel>> {
    match read_json::<Vec<Channel>>(path) {
        Ok(channels) => {
            info!("{} channels are loaded from {}", channels.len(), path.display());
            Ok(channels)
        }
        Err(AppError::ReadFile { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!("'{}' does not exist, fetching channels", path.display());
            let channels = list_channels(gateway).await?;
            write_json(path, &channels)?;
            info!("{} channels are saved to {}", channels.len(), path.display());
            read_json(path)
        }
        Err(e) => Err(e),
    }
}
