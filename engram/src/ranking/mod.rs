//! Query-time ordering of vector-search hits and declarative result filters.

mod engine;
mod filters;

pub use engine::{RankingEngine, RankingOptions};
pub use filters::{apply_filters, matches_filters};
