//! Candidate fact production: LLM extraction, the deterministic regex
//! supplement, permanence/kind/expiry classification, and noise filtering.

pub mod classify;
mod extractor;
mod filter;
pub mod rules;

pub use extractor::FactExtractor;
pub use filter::filter_noise;
pub use rules::supplement_candidates;

/// Lowercase, strip punctuation, collapse whitespace. The shared content
/// normalization used for dedup comparisons everywhere in the crate.
pub fn normalize_content(content: &str) -> String {
    let lowered = content.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop exact normalized duplicates; for substring near-duplicates keep only
/// the longer candidate.
pub fn dedup_candidates(
    candidates: Vec<crate::models::FactCandidate>,
) -> Vec<crate::models::FactCandidate> {
    let mut kept: Vec<(String, crate::models::FactCandidate)> = Vec::new();

    'outer: for candidate in candidates {
        let normalized = normalize_content(&candidate.content);
        if normalized.is_empty() {
            continue;
        }

        for (existing_norm, existing) in kept.iter_mut() {
            if *existing_norm == normalized {
                continue 'outer;
            }
            if existing_norm.contains(&normalized) {
                continue 'outer;
            }
            if normalized.contains(existing_norm.as_str()) {
                *existing_norm = normalized;
                *existing = candidate;
                continue 'outer;
            }
        }

        kept.push((normalized, candidate));
    }

    kept.into_iter().map(|(_, c)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FactCandidate;

    #[test]
    fn test_normalize_content() {
        assert_eq!(
            normalize_content("  User's   favorite tea is OOLONG! "),
            "user s favorite tea is oolong"
        );
    }

    #[test]
    fn test_dedup_exact_duplicates() {
        let candidates = vec![
            FactCandidate::new("User likes tea"),
            FactCandidate::new("User likes tea."),
        ];
        assert_eq!(dedup_candidates(candidates).len(), 1);
    }

    #[test]
    fn test_dedup_substring_keeps_longer() {
        let candidates = vec![
            FactCandidate::new("User works at Acme"),
            FactCandidate::new("User works at Acme Corp in Lisbon"),
        ];
        let deduped = dedup_candidates(candidates);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].content, "User works at Acme Corp in Lisbon");
    }

    #[test]
    fn test_dedup_keeps_distinct() {
        let candidates = vec![
            FactCandidate::new("User likes tea"),
            FactCandidate::new("User owns a cat"),
        ];
        assert_eq!(dedup_candidates(candidates).len(), 2);
    }
}
