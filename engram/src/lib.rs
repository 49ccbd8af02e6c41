//! Memory fact lifecycle and consistency engine.
//!
//! Ingested text is normalized (temporal expressions and pronouns resolved),
//! decomposed into atomic facts, classified, deduplicated, and checked for
//! contradictions against the owner's existing facts; a contradiction
//! supersedes the old fact on a version chain instead of editing it in
//! place. At query time, vector-search hits are ranked by similarity,
//! latest-status, and recency so the current version of any fact wins.

pub mod config;
pub mod consistency;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod services;
pub mod store;

pub use config::Config;
pub use engine::Engine;
pub use error::{EngramError, Result};
