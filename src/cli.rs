use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slack-digest")]
#[command(about = "Download recent Slack channel history and report on it")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download recent history of every public channel
    Download,

    /// Each member's three most used emoji
    Favorite {
        /// Output file path
        #[arg(short, long, default_value = "favorite.json")]
        output: String,
    },

    /// Render an edited favorite report as HTML
    FavoriteHtml {
        /// Edited favorite report
        #[arg(short, long, default_value = "favorite_edited.json")]
        input: String,

        /// Emoji name to image URL map
        #[arg(long, default_value = "favorite_map.json")]
        images: String,

        /// Output HTML file path
        #[arg(short, long, default_value = "output.html")]
        output: String,
    },

    /// Longest messages written by members
    Longest {
        /// Output file path
        #[arg(short, long, default_value = "longest.json")]
        output: String,
    },

    /// Most reacted messages
    Popular {
        /// Output file path
        #[arg(short, long, default_value = "popular.json")]
        output: String,
    },

    /// Usage of every custom emoji and the ones nobody uses
    Stale {
        /// Output file path for all emoji counts
        #[arg(short, long, default_value = "all_emojis.json")]
        output: String,

        /// Output file path for unused custom emoji
        #[arg(short, long, default_value = "unused_emojis.json")]
        unused: String,
    },
}
