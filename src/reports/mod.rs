//! Analyses over the saved channel artifacts.

pub mod favorite;
pub mod longest;
pub mod popular;
pub mod stale;

pub use favorite::{run_favorite, run_favorite_html};
pub use longest::run_longest;
pub use popular::run_popular;
pub use stale::run_stale;
