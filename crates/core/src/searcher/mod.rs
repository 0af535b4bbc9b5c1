//! Video search abstraction.
//!
//! The resolver talks to a [`Searcher`]; [`YoutubeSearcher`] implements it on
//! top of the YouTube Data API.

mod config;
mod types;
mod youtube;

pub use config::YoutubeConfig;
pub use types::*;
pub use youtube::YoutubeSearcher;
