use clap::Parser;
use slack_digest::settings::Settings;
use slack_digest::{Cli, Commands, commands};
use tracing::error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match Settings::load() {
        Ok(settings) => match cli.command {
            Commands::Download => commands::run_download(&settings).await,
            Commands::Favorite { output } => commands::run_favorite(&settings, &output).await,
            Commands::FavoriteHtml {
                input,
                images,
                output,
            } => commands::run_favorite_html(&input, &images, &output),
            Commands::Longest { output } => commands::run_longest(&settings, &output),
            Commands::Popular { output } => commands::run_popular(&settings, &output),
            Commands::Stale { output, unused } => commands::run_stale(&settings, &output, &unused),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
