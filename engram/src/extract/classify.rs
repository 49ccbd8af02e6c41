//! Candidate classification: permanence class, fact kind, and expiry.
//!
//! The cascade here is deterministic and overrides whatever provisional flags
//! came back from the LLM. Rules are evaluated in order, first match wins.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::models::{FactCandidate, FactKind};

static IDENTITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bname is\b",
        r"(?i)\bbirthday\b",
        r"(?i)\banniversary\b",
        r"(?i)\bborn (?:on|in)\b",
        r"(?i)\b\d{1,3} years old\b",
        r"(?i)\b(?:studied|graduated|degree in|majored in)\b",
        r"(?i)\b(?:is from|originally from|grew up in)\b",
        r"(?i)\b(?:married to|is [\w']+ (?:wife|husband|partner|mother|mom|father|dad|sister|brother|daughter|son))\b",
        r"(?i)\bnationality\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TEMPORARY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bcurrently\b",
        r"(?i)\bright now\b",
        r"(?i)\bat the moment\b",
        r"(?i)\bthis (?:week|month|quarter|year)\b",
        r"(?i)\bfor now\b",
        r"(?i)\btemporarily\b",
        r"(?i)\bis (?:working|reading|learning|building|writing|planning|preparing|traveling|staying|visiting)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static PERMANENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:works as|is an? \w+ (?:engineer|developer|designer|manager|analyst|scientist|teacher|nurse|doctor|writer|consultant|researcher|architect))\b",
        r"(?i)\bworks (?:at|for)\b",
        r"(?i)\blives in\b",
        r"(?i)\b(?:speaks|is fluent in|knows how to)\b",
        r"(?i)\b(?:plays|enjoys|practices)\b",
        r"(?i)\bhas a (?:dog|cat|bird|rabbit|hamster|fish|parrot|turtle|pet)\b",
        r"(?i)\ballergic to\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static NAMED_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+ [A-Z][a-z]+\b").unwrap());

static POSSESSIVE_SUBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+'s\b").unwrap());

static RECURRING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:birthday|anniversary|born on)\b").unwrap());

static EVENT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:meeting|deadline|appointment|conference|interview|flight|trip|launch|demo|presentation|review|call|scheduled|reminder)\b",
    )
    .unwrap()
});

static PREFERENCE_VERBS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prefers?|likes?|loves?|enjoys?|favorite|hates?|dislikes?)\b").unwrap()
});

static CONTENT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());

static RELATIVE_OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bin (\d{1,3}) (hour|day|week|month)s?\b").unwrap());

/// Permanence cascade. Identity facts are static no matter how they are
/// phrased; temporary indicators force dynamic even over permanent-looking
/// patterns.
pub fn classify_permanence(content: &str) -> bool {
    if IDENTITY_PATTERNS.iter().any(|p| p.is_match(content)) {
        return true;
    }
    if TEMPORARY_PATTERNS.iter().any(|p| p.is_match(content)) {
        return false;
    }
    if PERMANENT_PATTERNS.iter().any(|p| p.is_match(content)) {
        return true;
    }
    if content.starts_with("User") {
        return false;
    }
    NAMED_SUBJECT.is_match(content) || POSSESSIVE_SUBJECT.is_match(content)
}

/// Kind cascade. Recurring biographical dates stay `Fact` so the expiry path
/// never auto-forgets them. `provisional` is the extractor's guess, used only
/// when no keyword rule fires.
pub fn classify_kind(content: &str, provisional: FactKind) -> FactKind {
    if RECURRING_DATE.is_match(content) {
        return FactKind::Fact;
    }
    if EVENT_KEYWORDS.is_match(content) {
        return FactKind::Event;
    }
    if PREFERENCE_VERBS.is_match(content) {
        return FactKind::Preference;
    }
    provisional
}

/// Expiry is only computed for events. A concrete date in the content (the
/// normalizer has already rewritten relative expressions) expires at the end
/// of that day; an event with no recognizable time gets the default window.
pub fn compute_expiry(
    content: &str,
    kind: FactKind,
    now: DateTime<Utc>,
    default_event_expiry_days: i64,
) -> Option<DateTime<Utc>> {
    if kind != FactKind::Event {
        return None;
    }

    if let Some(caps) = CONTENT_DATE.captures(content) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        let end_of_day = date.and_hms_opt(23, 59, 59)?.and_utc();
        if end_of_day > now {
            return Some(end_of_day);
        }
    }

    if let Some(caps) = RELATIVE_OFFSET.captures(content) {
        let amount: i64 = caps[1].parse().ok()?;
        let offset = match caps[2].to_lowercase().as_str() {
            "hour" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            _ => Duration::days(amount * 30),
        };
        return Some(now + offset);
    }

    Some(now + Duration::days(default_event_expiry_days))
}

/// Apply the full cascade to a candidate in place.
pub fn classify_candidate(
    candidate: &mut FactCandidate,
    now: DateTime<Utc>,
    default_event_expiry_days: i64,
) {
    candidate.is_core = classify_permanence(&candidate.content);
    candidate.kind = classify_kind(&candidate.content, candidate.kind);
    if candidate.expires_at.is_none() {
        candidate.expires_at = compute_expiry(
            &candidate.content,
            candidate.kind,
            now,
            default_event_expiry_days,
        );
    }
}
