//! Embedding-based contradiction sweep. Runs after a new fact is saved with
//! its embedding; a second safety net behind the lexical path, using a
//! smaller (entity, attribute) signature set.

use std::sync::LazyLock;

use regex::Regex;

/// The attribute families the semantic path recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Location,
    Workplace,
    Job,
    Favorite(String),
    Age,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub entity: String,
    pub attribute: Attribute,
}

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(User|[A-Z][a-z]+(?: [A-Z][a-z]+)?)(?:'s)?\b").unwrap());

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:lives in|living in|based in|moved to|relocated to)\b").unwrap()
});

static WORKPLACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bworks (?:at|for)\b").unwrap());

static JOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:is an? [\w ]*(?:engineer|developer|designer|manager|analyst|scientist|teacher|nurse|doctor|writer|consultant|researcher|architect)|works as)\b").unwrap()
});

static FAVORITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bfavou?rite (\w+)").unwrap());

static AGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d{1,3} years old\b").unwrap());

/// Extract the (entity, attribute) signature of a fact's content. `None` when
/// the content has no recognizable subject or attribute, which keeps the
/// semantic path conservative.
pub fn extract_signature(content: &str) -> Option<Signature> {
    let entity = ENTITY.captures(content)?[1].to_string();

    let attribute = if let Some(caps) = FAVORITE.captures(content) {
        Attribute::Favorite(caps[1].to_lowercase())
    } else if LOCATION.is_match(content) {
        Attribute::Location
    } else if WORKPLACE.is_match(content) {
        Attribute::Workplace
    } else if JOB.is_match(content) {
        Attribute::Job
    } else if AGE.is_match(content) {
        Attribute::Age
    } else {
        return None;
    };

    Some(Signature { entity, attribute })
}

/// Whether two contents describe the same attribute of the same entity.
pub fn signatures_match(new_content: &str, existing_content: &str) -> bool {
    match (extract_signature(new_content), extract_signature(existing_content)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
