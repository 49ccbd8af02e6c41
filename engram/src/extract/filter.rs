//! Noise and validity filtering for extracted candidates. Runs after dedup;
//! checks apply in a fixed order so rejection reasons stay stable.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{FactCandidate, FactKind};

const MIN_CONTENT_LEN: usize = 10;
const MIN_CONFIDENCE: f64 = 0.6;

const DANGLING_ENDINGS: &[&str] = &[
    "and", "or", "but", "with", "to", "of", "in", "on", "at", "for", "by", "from", "the", "a",
    "an", "is", "was",
];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "is", "was", "are", "were", "be", "been", "being", "to", "of", "in", "on",
    "at", "for", "by", "from", "with", "and", "or", "but", "it", "its", "this", "that", "these",
    "those", "user", "user's", "i", "my", "me", "we", "our", "he", "she", "they", "his", "her",
    "their", "has", "have", "had", "do", "does", "did", "not", "no", "so", "as", "about",
];

static CODE_CONTENT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // filesystem paths
        r"(?:^|\s)/[\w./-]+",
        r"[A-Za-z]:\\[\w\\.-]+",
        // file extensions
        r"\b\w+\.(?:rs|py|js|ts|go|java|cpp|json|yaml|yml|toml|sql|sh|md|txt|csv|html|css)\b",
        // code syntax
        r"[{};=]|::|->|=>|\(\)|\[\]",
        r"(?i)\b(?:fn|def|func|var|let|const|import|return|println|console\.log)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TECHNICAL_TERMS: &[&str] = &[
    "python", "rust", "javascript", "typescript", "java", "golang", "kotlin", "swift", "ruby",
    "docker", "kubernetes", "react", "angular", "vue", "django", "flask", "postgres",
    "postgresql", "mysql", "redis", "mongodb", "linux", "ubuntu", "debian", "aws", "azure",
    "github", "gitlab", "terraform", "node", "nodejs",
];

static PLACE_MISCLASSIFICATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:lives in|works at|is from|based in) ([\w.+#-]+)").unwrap()
});

static GREETING_OR_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:hi|hello|hey|thanks|thank you|ok|okay|sure|yes|no|good morning|good evening|got it|sounds good)\b",
    )
    .unwrap()
});

static ORG_OWNS_PET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:company|corp|corporation|inc|team|office|startup|organization|org|business)\b.{0,40}\b(?:has|have|owns?|adopted|got) an? (?:dog|cat|bird|rabbit|hamster|fish|parrot|turtle|pet)\b",
    )
    .unwrap()
});

fn ends_dangling(content: &str) -> bool {
    let trimmed = content.trim_end_matches(['.', ',', '!', '?', ' ']);
    match trimmed.rsplit(' ').next() {
        Some(last) => DANGLING_ENDINGS.contains(&last.to_lowercase().as_str()),
        None => true,
    }
}

fn looks_like_code(content: &str) -> bool {
    CODE_CONTENT.iter().any(|p| p.is_match(content))
}

fn technical_place(content: &str) -> bool {
    PLACE_MISCLASSIFICATION
        .captures(content)
        .map(|caps| TECHNICAL_TERMS.contains(&caps[1].to_lowercase().as_str()))
        .unwrap_or(false)
}

fn low_information(content: &str) -> bool {
    if content.len() < MIN_CONTENT_LEN {
        return true;
    }
    if GREETING_OR_QUESTION.is_match(content) || content.trim_end().ends_with('?') {
        return true;
    }
    let substantive = content
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(&w.as_str()))
        .count();
    substantive < 2
}

/// Returns true when the candidate should be kept.
pub fn keep_candidate(candidate: &FactCandidate) -> bool {
    let content = candidate.content.trim();

    if ends_dangling(content) {
        tracing::debug!(content, "Dropped candidate: dangling ending");
        return false;
    }
    if looks_like_code(content) {
        tracing::debug!(content, "Dropped candidate: code content");
        return false;
    }
    if technical_place(content) {
        tracing::debug!(content, "Dropped candidate: technical term as place");
        return false;
    }
    if low_information(content) {
        tracing::debug!(content, "Dropped candidate: low information");
        return false;
    }
    if ORG_OWNS_PET.is_match(content) {
        tracing::debug!(content, "Dropped candidate: organization owning a pet");
        return false;
    }
    if candidate.confidence < MIN_CONFIDENCE
        && candidate.entities.is_empty()
        && candidate.kind != FactKind::Event
    {
        tracing::debug!(content, confidence = candidate.confidence, "Dropped candidate: low confidence");
        return false;
    }
    true
}

/// Filter a candidate list in place, keeping the original order.
pub fn filter_noise(candidates: Vec<FactCandidate>) -> Vec<FactCandidate> {
    candidates.into_iter().filter(keep_candidate).collect()
}
