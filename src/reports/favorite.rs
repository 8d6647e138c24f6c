//! Each member's three most used emoji, counting both what they typed and
//! what they reacted with.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, Result};
use crate::emoji::{extract_emojis_from_text, reaction_name};
use crate::gateway::{Gateway, SlackApi, Sleeper};
use crate::model::{Message, User};
use crate::store::{ArtifactStore, read_json, write_json};

pub const TOP_PER_USER: usize = 3;

/// Shortcodes that are really pieces of `HH:MM:SS` clock times.
const CLOCK_FRAGMENTS: [&str; 3] = ["00", "23", "49"];

const COUNT_SUFFIX: &str = "번";

pub type UsageCounter = BTreeMap<String, BTreeMap<String, u64>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteUser {
    pub id: String,
    pub image: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRow {
    pub user: FavoriteUser,
    pub emoji: BTreeMap<String, u64>,
}

/// Credits text emoji to the author and each reaction to every user who
/// added it. Only messages from human members count.
pub fn count_usage_by_user(messages: &[Message]) -> UsageCounter {
    let mut counter = UsageCounter::new();

    for message in messages.iter().filter(|m| m.is_human()) {
        let authored = counter.entry(message.user_id().to_string()).or_default();
        for name in extract_emojis_from_text(&message.text) {
            if CLOCK_FRAGMENTS.contains(&name.as_str()) {
                continue;
            }
            *authored.entry(name).or_insert(0) += 1;
        }

        for reaction in &message.reactions {
            let name = reaction_name(reaction);
            for user in &reaction.users {
                *counter
                    .entry(user.clone())
                    .or_default()
                    .entry(name.clone())
                    .or_insert(0) += 1;
            }
        }
    }

    counter
}

/// At most [`TOP_PER_USER`] entries per user, highest counts kept. Users with
/// no usage at all are left out.
pub fn top_by_user(counter: &UsageCounter) -> UsageCounter {
    counter
        .iter()
        .filter(|(_, usage)| !usage.is_empty())
        .map(|(user, usage)| {
            let mut ranked: Vec<(&String, &u64)> = usage.iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let top = ranked
                .into_iter()
                .take(TOP_PER_USER)
                .map(|(name, count)| (name.clone(), *count))
                .collect();
            (user.clone(), top)
        })
        .collect()
}

/// "Gildong Hong" is shown as "HongGildong"; single names are kept.
fn display_name(real_name: &str) -> String {
    let mut parts = real_name.split(' ');
    match (parts.next(), parts.next()) {
        (Some(given), Some(family)) => format!("{}{}", family, given),
        _ => real_name.to_string(),
    }
}

/// Human members that have a real name, keyed by id.
pub fn user_directory(users: &[User]) -> HashMap<String, FavoriteUser> {
    users
        .iter()
        .filter(|u| !u.is_bot && !u.real_name().is_empty())
        .map(|u| {
            let user = FavoriteUser {
                id: u.id.clone(),
                image: u.image().to_string(),
                name: display_name(u.real_name()),
            };
            (u.id.clone(), user)
        })
        .collect()
}

/// Rows for every ranked user found in the directory, ordered by user id.
pub fn favorite_rows(top: &UsageCounter, directory: &HashMap<String, FavoriteUser>) -> Vec<FavoriteRow> {
    top.iter()
        .filter_map(|(id, emoji)| {
            directory.get(id).map(|user| FavoriteRow {
                user: user.clone(),
                emoji: emoji.clone(),
            })
        })
        .collect()
}

pub async fn run_favorite<A: SlackApi, S: Sleeper>(
    gateway: &Gateway<A, S>,
    store: &ArtifactStore,
    output: &Path,
) -> Result<usize> {
    let messages = store.load_all()?;
    let top = top_by_user(&count_usage_by_user(&messages));
    let directory = user_directory(&gateway.all_users().await?);
    let rows = favorite_rows(&top, &directory);

    let names: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.emoji.keys().map(String::as_str))
        .collect();
    let listing: Vec<String> = names.iter().map(|name| format!(":{}:", name)).collect();
    info!("favorite emoji:\n{}", listing.join("\n"));

    write_json(output, &rows)?;
    Ok(rows.len())
}

/// One `<div>` per row, emoji most used first. Emoji without an image in
/// `images` get an empty source.
pub fn render_favorite_html(rows: &[FavoriteRow], images: &BTreeMap<String, String>) -> String {
    let mut html = String::new();
    for row in rows {
        let _ = writeln!(html, "<div>");
        let _ = writeln!(
            html,
            "  <img src=\"{}\"><span>{}</span>",
            html_escape::encode_double_quoted_attribute(&row.user.image),
            html_escape::encode_text(&row.user.name),
        );
        let mut emoji: Vec<(&String, &u64)> = row.emoji.iter().collect();
        emoji.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (name, count) in emoji {
            let image = images.get(name).map(String::as_str).unwrap_or_default();
            let _ = writeln!(
                html,
                "  <img src=\"{}\" alt=\"{}\"><span>{}{}</span>",
                html_escape::encode_double_quoted_attribute(image),
                html_escape::encode_double_quoted_attribute(name),
                count,
                COUNT_SUFFIX,
            );
        }
        let _ = writeln!(html, "</div>");
    }
    html
}

/// Renders a hand-edited favorite report against an emoji name to image map.
pub fn run_favorite_html(rows_path: &Path, images_path: &Path, output: &Path) -> Result<usize> {
    let rows: Vec<FavoriteRow> = read_json(rows_path)?;
    let images: BTreeMap<String, String> = read_json(images_path)?;

    let html = render_favorite_html(&rows, &images);
    fs::write(output, html).map_err(|source| AppError::WriteFile {
        path: output.display().to_string(),
        source,
    })?;

    info!(rows = rows.len(), output = %output.display(), "favorite page written");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{Channel, Page, Reaction};
    use crate::testing::{RecordingSleeper, ScriptedApi, message, user};
    use tempfile::tempdir;

    fn said(user: &str, text: &str) -> Message {
        let mut said = message("1.0");
        said.user = Some(user.to_string());
        said.text = text.to_string();
        said
    }

    fn reaction(name: &str, users: &[&str]) -> Reaction {
        Reaction {
            name: name.to_string(),
            count: users.len() as u64,
            users: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    fn usage(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_text_emoji_credited_to_author() {
        let counter = count_usage_by_user(&[said("U1", ":tada: :tada: :heart:")]);

        assert_eq!(counter["U1"], usage(&[("tada", 2), ("heart", 1)]));
    }

    #[test]
    fn test_clock_fragments_are_ignored() {
        let counter = count_usage_by_user(&[said("U1", "회의는 12:00:23:49: 시작 :tada:")]);

        assert_eq!(counter["U1"], usage(&[("tada", 1)]));
    }

    #[test]
    fn test_reactions_credited_to_each_reacting_user() {
        let mut post = said("U1", "hello");
        post.reactions = vec![reaction("+1::skin-tone-2", &["U2", "U3"]), reaction("eyes", &["U2"])];

        let counter = count_usage_by_user(&[post]);

        assert_eq!(counter["U2"], usage(&[("+1", 1), ("eyes", 1)]));
        assert_eq!(counter["U3"], usage(&[("+1", 1)]));
        assert!(counter["U1"].is_empty());
    }

    #[test]
    fn test_bot_posts_are_ignored() {
        let mut post = said("U1", ":robot_face:");
        post.bot_id = Some("B1".to_string());
        post.reactions = vec![reaction("eyes", &["U2"])];

        assert!(count_usage_by_user(&[post]).is_empty());
    }

    #[test]
    fn test_top_by_user_keeps_three_highest() {
        let mut counter = UsageCounter::new();
        counter.insert(
            "U1".to_string(),
            usage(&[("a", 1), ("b", 5), ("c", 3), ("d", 4)]),
        );
        counter.insert("U2".to_string(), BTreeMap::new());

        let top = top_by_user(&counter);

        assert_eq!(top["U1"], usage(&[("b", 5), ("d", 4), ("c", 3)]));
        assert!(!top.contains_key("U2"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Gildong Hong"), "HongGildong");
        assert_eq!(display_name("홍길동"), "홍길동");
        assert_eq!(display_name("A B C"), "BA");
    }

    #[test]
    fn test_user_directory_skips_bots_and_nameless() {
        let mut bot = user("B1", "Helper Bot");
        bot.is_bot = true;
        let users = vec![user("U1", "Gildong Hong"), user("U2", ""), bot];

        let directory = user_directory(&users);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory["U1"].name, "HongGildong");
    }

    #[tokio::test]
    async fn test_run_favorite_writes_rows_for_known_users() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("raw"));
        let mut post = said("U1", ":tada:");
        post.reactions = vec![reaction("eyes", &["U2", "U9"])];
        store.save(&Channel::new("C1", "general"), &[post]).unwrap();

        let api = ScriptedApi::default();
        api.push_users(Ok(Page::new(
            vec![user("U1", "Gildong Hong"), user("U2", "Younghee")],
            None,
            false,
        )));
        let gateway = Gateway::new(api, RecordingSleeper::default(), Duration::ZERO);
        let output = dir.path().join("favorite.json");

        let count = run_favorite(&gateway, &store, &output).await.unwrap();

        assert_eq!(count, 2);
        let rows: Vec<FavoriteRow> = read_json(&output).unwrap();
        assert_eq!(rows[0].user.id, "U1");
        assert_eq!(rows[0].emoji, usage(&[("tada", 1)]));
        assert_eq!(rows[1].user.name, "Younghee");
        assert_eq!(rows[1].emoji, usage(&[("eyes", 1)]));
    }

    #[test]
    fn test_render_favorite_html_escapes() {
        let rows = vec![FavoriteRow {
            user: FavoriteUser {
                id: "U1".to_string(),
                image: "https://img/u1.png?a=1&b=2".to_string(),
                name: "<Kim>".to_string(),
            },
            emoji: usage(&[("eyes", 1), ("tada", 3)]),
        }];
        let mut images = BTreeMap::new();
        images.insert("tada".to_string(), "https://img/tada.png".to_string());

        let html = render_favorite_html(&rows, &images);

        let tada = html.find("alt=\"tada\"").unwrap();
        let eyes = html.find("alt=\"eyes\"").unwrap();
        assert!(tada < eyes);
        assert!(html.contains("<img src=\"https://img/u1.png?a=1&amp;b=2\"><span>&lt;Kim&gt;</span>"));
        assert!(html.contains("<img src=\"https://img/tada.png\" alt=\"tada\"><span>3번</span>"));
        assert!(html.starts_with("<div>\n"));
        assert!(html.ends_with("</div>\n"));
    }

    #[test]
    fn test_run_favorite_html() {
        let dir = tempdir().unwrap();
        let rows_path = dir.path().join("favorite_edited.json");
        let images_path = dir.path().join("favorite_map.json");
        let output = dir.path().join("output.html");
        let rows = vec![FavoriteRow {
            user: FavoriteUser {
                id: "U1".to_string(),
                image: String::new(),
                name: "Kim".to_string(),
            },
            emoji: usage(&[("unknown", 1)]),
        }];
        write_json(&rows_path, &rows).unwrap();
        write_json(&images_path, &BTreeMap::<String, String>::new()).unwrap();

        assert_eq!(run_favorite_html(&rows_path, &images_path, &output).unwrap(), 1);
        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<img src=\"\" alt=\"unknown\"><span>1번</span>"));
    }
}
