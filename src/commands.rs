use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::catalog::load_channels;
use crate::error::Result;
use crate::gateway::{Gateway, SlackApi, Sleeper, TokioSleeper};
use crate::load_token;
use crate::normalize::normalize_keys;
use crate::reports;
use crate::retrieval::{RetrievalReport, Retriever};
use crate::settings::Settings;
use crate::slack::SlackMorphismApi;
use crate::store::{ArtifactStore, write_json};

pub type LiveGateway = Gateway<SlackMorphismApi, TokioSleeper>;

/// Gateway over the live Web API, authenticated with `SLACK_BOT_TOKEN`.
pub fn connect(settings: &Settings) -> Result<LiveGateway> {
    let token = load_token()?;
    let api = SlackMorphismApi::new(&token, settings.retrieval.page_limit)?;
    Ok(Gateway::new(api, TokioSleeper, settings.retrieval.throttle()))
}

/// Verifies the token, snapshots the custom emoji list, then saves every
/// channel of the catalog that has no artifact yet.
pub async fn download<A: SlackApi, S: Sleeper>(
    gateway: &Gateway<A, S>,
    settings: &Settings,
) -> Result<RetrievalReport> {
    let bot_user = gateway.auth_test().await?;
    info!(user = %bot_user, "authenticated");

    let emojis = normalize_keys(gateway.emoji_list().await?);
    write_json(&settings.paths.emojis, &emojis)?;
    info!(count = emojis.len(), path = %settings.paths.emojis.display(), "saved custom emoji list");

    let channels = load_channels(gateway, &settings.paths.channels).await?;
    let store = ArtifactStore::new(&settings.paths.raw_dir);
    let oldest = settings.retrieval.oldest(Utc::now());
    info!(channels = channels.len(), oldest = %oldest, "retrieving channel history");

    Retriever::new(gateway, &store, oldest).run(&channels).await
}

pub async fn run_download(settings: &Settings) -> Result<()> {
    let gateway = connect(settings)?;
    let report = download(&gateway, settings).await?;

    info!(
        "Download completed! {} channels saved, {} already saved, {} skipped.",
        report.saved,
        report.already_done,
        report.archived + report.not_in_channel
    );
    Ok(())
}

pub fn run_popular(settings: &Settings, output: &str) -> Result<()> {
    let store = ArtifactStore::new(&settings.paths.raw_dir);
    let count = reports::run_popular(&store, Path::new(output))?;

    info!("Report written to {}: {} messages.", output, count);
    Ok(())
}

pub fn run_longest(settings: &Settings, output: &str) -> Result<()> {
    let store = ArtifactStore::new(&settings.paths.raw_dir);
    let count = reports::run_longest(&store, Path::new(output))?;

    info!("Report written to {}: {} messages.", output, count);
    Ok(())
}

pub async fn run_favorite(settings: &Settings, output: &str) -> Result<()> {
    let gateway = connect(settings)?;
    let store = ArtifactStore::new(&settings.paths.raw_dir);
    let count = reports::run_favorite(&gateway, &store, Path::new(output)).await?;

    info!("Report written to {}: {} members.", output, count);
    Ok(())
}

pub fn run_favorite_html(input: &str, images: &str, output: &str) -> Result<()> {
    let count = reports::run_favorite_html(Path::new(input), Path::new(images), Path::new(output))?;

    info!("Page written to {}: {} members.", output, count);
    Ok(())
}

pub fn run_stale(settings: &Settings, output: &str, unused: &str) -> Result<()> {
    let store = ArtifactStore::new(&settings.paths.raw_dir);
    let report = reports::run_stale(&store, &settings.paths.emojis, Path::new(output), Path::new(unused))?;

    info!(
        "Reports written to {} and {}: {} emoji, {} unused.",
        output,
        unused,
        report.all.len(),
        report.unused.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::*;
    use crate::AppError;
    use crate::model::{Channel, Message};
    use crate::store::read_json;
    use crate::testing::{Call, RecordingSleeper, ScriptedApi, channel_page, history_page, message};
    use tempfile::tempdir;

    fn settings_in(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.channels = dir.join("channels.json");
        settings.paths.raw_dir = dir.join("raw");
        settings.paths.emojis = dir.join("emojis.json");
        settings
    }

    #[tokio::test]
    async fn test_download_end_to_end() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let api = ScriptedApi::default();
        let mut emojis = BTreeMap::new();
        emojis.insert("cafe\u{301}".to_string(), "https://emoji/cafe.png".to_string());
        api.set_emojis(emojis);
        api.push_channels(Ok(channel_page(vec![Channel::new("C1", "general")], None)));
        api.push_history("C1", Ok(history_page(vec![message("1.0")], None)));
        let gateway = Gateway::new(api, RecordingSleeper::default(), Duration::ZERO);

        let report = download(&gateway, &settings).await.unwrap();

        assert_eq!(report.saved, 1);
        let emojis: BTreeMap<String, String> = read_json(&settings.paths.emojis).unwrap();
        assert!(emojis.contains_key("cafe"));
        let channels: Vec<Channel> = read_json(&settings.paths.channels).unwrap();
        assert_eq!(channels.len(), 1);
        let saved: Vec<Message> = read_json(&settings.paths.raw_dir.join("general.json")).unwrap();
        assert_eq!(saved, vec![message("1.0")]);
        assert_eq!(gateway.api().calls()[0], Call::Auth);
    }

    #[tokio::test]
    async fn test_download_stops_on_auth_failure() {
        let dir = tempdir().unwrap();
        let settings = settings_in(dir.path());
        let api = ScriptedApi::default();
        api.push_auth(Err(AppError::Auth("invalid_auth".to_string())));
        let gateway = Gateway::new(api, RecordingSleeper::default(), Duration::ZERO);

        let err = download(&gateway, &settings).await.unwrap_err();

        assert!(matches!(err, AppError::Auth(ref code) if code == "invalid_auth"));
        assert_eq!(gateway.api().calls(), vec![Call::Auth]);
        assert!(!settings.paths.emojis.exists());
    }
}
