//! Pure text transforms applied before extraction.
//!
//! Temporal normalization rewrites relative date expressions into absolute
//! `YYYY-MM-DD[ at HH:MM UTC]` form; pronoun resolution replaces singular
//! pronouns with their tracked named antecedents. Downstream fact templates
//! never emit pronouns or relative dates, so both transforms must run before
//! the extractor sees the text.

mod pronoun;
mod temporal;

pub use pronoun::resolve_pronouns;
pub use temporal::{find_context_date, normalize_temporal};

use chrono::{DateTime, Utc};

/// Full normalization pipeline: temporal rewrite (against an explicit context
/// date when the text carries one), then pronoun resolution.
pub fn normalize_text(text: &str, now: DateTime<Utc>) -> String {
    let reference = find_context_date(text).unwrap_or(now);
    let rewritten = normalize_temporal(text, reference);
    resolve_pronouns(&rewritten)
}
