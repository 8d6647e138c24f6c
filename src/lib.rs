pub mod catalog;
pub mod cli;
pub mod commands;
pub mod emoji;
pub mod error;
pub mod gateway;
pub mod history;
pub mod model;
pub mod normalize;
pub mod reports;
pub mod retrieval;
pub mod settings;
pub mod slack;
pub mod store;

#[cfg(test)]
mod testing;

pub use cli::{Cli, Commands};
pub use error::{AppError, Result};

pub const TOKEN_ENV: &str = "SLACK_BOT_TOKEN";

pub fn load_token() -> Result<String> {
    std::env::var(TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingToken)
}
