use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc, Weekday};
use regex::{Captures, Regex};

/// Optional time suffix shared by the date rules: ` at 10`, ` at 10:30`,
/// ` at 10am`, ` at 10:30 pm`.
const TIME_SUFFIX: &str = r"(?:\s+at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?)?";

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// One rewrite rule: a pattern and the resolver turning its match into an
/// absolute form. Rules are evaluated in table order; earlier rules consume
/// their matches so later, more general patterns never see them.
struct RewriteRule {
    pattern: Regex,
    apply: fn(&Captures, DateTime<Utc>) -> String,
}

static REWRITE_RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(|| {
    vec![
        RewriteRule {
            pattern: Regex::new(&format!(
                r"(?i)\b(tomorrow|today|yesterday)\b{TIME_SUFFIX}"
            ))
            .unwrap(),
            apply: rewrite_day_word,
        },
        RewriteRule {
            pattern: Regex::new(&format!(r"(?i)\bnext\s+({WEEKDAYS})\b{TIME_SUFFIX}")).unwrap(),
            apply: rewrite_next_weekday,
        },
        RewriteRule {
            pattern: Regex::new(&format!(r"(?i)\bthis\s+({WEEKDAYS})\b{TIME_SUFFIX}")).unwrap(),
            apply: rewrite_this_weekday,
        },
        RewriteRule {
            pattern: Regex::new(&format!(r"(?i)\b({WEEKDAYS})\b{TIME_SUFFIX}")).unwrap(),
            apply: rewrite_bare_weekday,
        },
        RewriteRule {
            pattern: Regex::new(r"(?i)\bin\s+(\d+)\s+(day|week|month|year)s?\b").unwrap(),
            apply: rewrite_in_offset,
        },
        RewriteRule {
            pattern: Regex::new(r"(?i)\b(\d+)\s+(day|week|month|year)s?\s+ago\b").unwrap(),
            apply: rewrite_ago_offset,
        },
        RewriteRule {
            pattern: Regex::new(r"(?i)\b(next|this|last)\s+week\b").unwrap(),
            apply: rewrite_week_anchor,
        },
        RewriteRule {
            pattern: Regex::new(r"(?i)\b(next|last)\s+month\b").unwrap(),
            apply: rewrite_month_anchor,
        },
    ]
});

static CONTEXT_DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // ISO dates, also matched by dated session headers like
        // "Session date: 2026-02-19".
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap(),
        // "February 19, 2026" / "february 19 2026"
        Regex::new(
            r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
        )
        .unwrap(),
        // US-style numeric dates, MM/DD/YYYY
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap(),
    ]
});

/// Scan for explicit date mentions and return the latest one found, as the
/// reference date for relative-expression resolution.
pub fn find_context_date(text: &str) -> Option<DateTime<Utc>> {
    let mut latest: Option<NaiveDate> = None;

    for (idx, pattern) in CONTEXT_DATE_PATTERNS.iter().enumerate() {
        for caps in pattern.captures_iter(text) {
            if let Some(date) = parse_context_date(idx, &caps) {
                latest = Some(latest.map_or(date, |prev| prev.max(date)));
            }
        }
    }

    latest
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_context_date(pattern_idx: usize, caps: &Captures) -> Option<NaiveDate> {
    match pattern_idx {
        0 => NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        ),
        1 => NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            month_number(&caps[1])?,
            caps[2].parse().ok()?,
        ),
        _ => NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
        ),
    }
}

/// Rewrite every relative date/time expression in `text` into absolute
/// `YYYY-MM-DD[ at HH:MM UTC]` form against the given reference instant.
pub fn normalize_temporal(text: &str, reference: DateTime<Utc>) -> String {
    let mut output = text.to_string();
    for rule in REWRITE_RULES.iter() {
        output = rule
            .pattern
            .replace_all(&output, |caps: &Captures| (rule.apply)(caps, reference))
            .into_owned();
    }
    output
}

fn month_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

fn parse_weekday(name: &str) -> Weekday {
    match name.to_lowercase().as_str() {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Format a resolved date, appending the time captured by `TIME_SUFFIX`
/// (groups `base`, `base+1`, `base+2`) when present. Bare hours under 12 are
/// assumed PM; am/pm markers convert to 24-hour UTC.
fn format_with_time(date: NaiveDate, caps: &Captures, base: usize) -> String {
    let Some(hour_match) = caps.get(base) else {
        return date.format("%Y-%m-%d").to_string();
    };
    let mut hour: u32 = hour_match.as_str().parse().unwrap_or(0);
    let minute: u32 = caps
        .get(base + 1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    match caps.get(base + 2).map(|m| m.as_str().to_lowercase()) {
        Some(ref meridiem) if meridiem == "am" => {
            if hour == 12 {
                hour = 0;
            }
        }
        Some(_) => {
            if hour != 12 {
                hour += 12;
            }
        }
        None => {
            if hour < 12 {
                hour += 12;
            }
        }
    }

    format!("{} at {:02}:{:02} UTC", date.format("%Y-%m-%d"), hour, minute)
}

fn rewrite_day_word(caps: &Captures, reference: DateTime<Utc>) -> String {
    let today = reference.date_naive();
    let date = match caps[1].to_lowercase().as_str() {
        "tomorrow" => today + Duration::days(1),
        "yesterday" => today - Duration::days(1),
        _ => today,
    };
    format_with_time(date, caps, 2)
}

/// "Next <weekday>" always lands in the week after the reference week,
/// never the nearest upcoming occurrence.
fn rewrite_next_weekday(caps: &Captures, reference: DateTime<Utc>) -> String {
    let target = parse_weekday(&caps[1]);
    let date = week_monday(reference.date_naive())
        + Duration::days(7 + target.num_days_from_monday() as i64);
    format_with_time(date, caps, 2)
}

fn rewrite_this_weekday(caps: &Captures, reference: DateTime<Utc>) -> String {
    let target = parse_weekday(&caps[1]);
    let date =
        week_monday(reference.date_naive()) + Duration::days(target.num_days_from_monday() as i64);
    format_with_time(date, caps, 2)
}

/// Bare weekday: nearest upcoming occurrence; a weekday matching the
/// reference day rolls over to next week.
fn rewrite_bare_weekday(caps: &Captures, reference: DateTime<Utc>) -> String {
    let target = parse_weekday(&caps[1]);
    let today = reference.date_naive();
    let mut ahead = (target.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    format_with_time(today + Duration::days(ahead), caps, 2)
}

fn add_unit(date: NaiveDate, amount: i64, unit: &str, forward: bool) -> NaiveDate {
    let signed = if forward { amount } else { -amount };
    match unit {
        "day" => date + Duration::days(signed),
        "week" => date + Duration::days(signed * 7),
        "month" => {
            let months = Months::new(amount as u32);
            if forward {
                date.checked_add_months(months).unwrap_or(date)
            } else {
                date.checked_sub_months(months).unwrap_or(date)
            }
        }
        _ => {
            let months = Months::new((amount * 12) as u32);
            if forward {
                date.checked_add_months(months).unwrap_or(date)
            } else {
                date.checked_sub_months(months).unwrap_or(date)
            }
        }
    }
}

fn rewrite_in_offset(caps: &Captures, reference: DateTime<Utc>) -> String {
    let amount: i64 = caps[1].parse().unwrap_or(0);
    let date = add_unit(
        reference.date_naive(),
        amount,
        &caps[2].to_lowercase(),
        true,
    );
    date.format("%Y-%m-%d").to_string()
}

fn rewrite_ago_offset(caps: &Captures, reference: DateTime<Utc>) -> String {
    let amount: i64 = caps[1].parse().unwrap_or(0);
    let date = add_unit(
        reference.date_naive(),
        amount,
        &caps[2].to_lowercase(),
        false,
    );
    date.format("%Y-%m-%d").to_string()
}

/// Week expressions resolve to a Monday-anchored range.
fn rewrite_week_anchor(caps: &Captures, reference: DateTime<Utc>) -> String {
    let monday = week_monday(reference.date_naive());
    let anchor = match caps[1].to_lowercase().as_str() {
        "next" => monday + Duration::days(7),
        "last" => monday - Duration::days(7),
        _ => monday,
    };
    format!("the week of {}", anchor.format("%Y-%m-%d"))
}

fn rewrite_month_anchor(caps: &Captures, reference: DateTime<Utc>) -> String {
    let today = reference.date_naive();
    let anchor = if caps[1].to_lowercase() == "next" {
        today.checked_add_months(Months::new(1)).unwrap_or(today)
    } else {
        today.checked_sub_months(Months::new(1)).unwrap_or(today)
    };
    anchor.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Thursday
    fn reference() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2026, 2, 19)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_next_weekday_is_following_week() {
        assert_eq!(
            normalize_temporal("Call with Dana next Friday at 10am", reference()),
            "Call with Dana 2026-02-27 at 10:00 UTC"
        );
        // Nearest Friday would be 2026-02-20; "next" must skip it.
        assert_eq!(
            normalize_temporal("next Monday", reference()),
            "2026-02-23"
        );
    }

    #[test]
    fn test_bare_weekday_is_nearest_upcoming() {
        assert_eq!(normalize_temporal("Monday", reference()), "2026-02-23");
        assert_eq!(normalize_temporal("Friday", reference()), "2026-02-20");
        // Same weekday as the reference rolls to next week.
        assert_eq!(normalize_temporal("Thursday", reference()), "2026-02-26");
    }

    #[test]
    fn test_this_weekday_stays_in_current_week() {
        assert_eq!(normalize_temporal("this Friday", reference()), "2026-02-20");
        assert_eq!(normalize_temporal("this Monday", reference()), "2026-02-16");
    }

    #[test]
    fn test_day_words() {
        assert_eq!(normalize_temporal("tomorrow", reference()), "2026-02-20");
        assert_eq!(normalize_temporal("yesterday", reference()), "2026-02-18");
        assert_eq!(
            normalize_temporal("today at 3pm", reference()),
            "2026-02-19 at 15:00 UTC"
        );
    }

    #[test]
    fn test_bare_hour_under_twelve_is_pm() {
        assert_eq!(
            normalize_temporal("tomorrow at 7", reference()),
            "2026-02-20 at 19:00 UTC"
        );
        assert_eq!(
            normalize_temporal("tomorrow at 7:15", reference()),
            "2026-02-20 at 19:15 UTC"
        );
        assert_eq!(
            normalize_temporal("tomorrow at 12", reference()),
            "2026-02-20 at 12:00 UTC"
        );
        assert_eq!(
            normalize_temporal("tomorrow at 12am", reference()),
            "2026-02-20 at 00:00 UTC"
        );
    }

    #[test]
    fn test_offsets() {
        assert_eq!(normalize_temporal("in 3 days", reference()), "2026-02-22");
        assert_eq!(normalize_temporal("in 2 weeks", reference()), "2026-03-05");
        assert_eq!(normalize_temporal("in 1 month", reference()), "2026-03-19");
        assert_eq!(normalize_temporal("in 2 years", reference()), "2028-02-19");
        assert_eq!(normalize_temporal("3 days ago", reference()), "2026-02-16");
        assert_eq!(normalize_temporal("1 week ago", reference()), "2026-02-12");
    }

    #[test]
    fn test_week_and_month_anchors() {
        assert_eq!(
            normalize_temporal("next week", reference()),
            "the week of 2026-02-23"
        );
        assert_eq!(
            normalize_temporal("this week", reference()),
            "the week of 2026-02-16"
        );
        assert_eq!(
            normalize_temporal("last week", reference()),
            "the week of 2026-02-09"
        );
        assert_eq!(normalize_temporal("next month", reference()), "2026-03");
        assert_eq!(normalize_temporal("last month", reference()), "2026-01");
    }

    #[test]
    fn test_unrelated_text_untouched() {
        let text = "User works at Acme Corp and owns a cat named Biscuit";
        assert_eq!(normalize_temporal(text, reference()), text);
    }

    #[test]
    fn test_find_context_date_latest_wins() {
        let text = "Session date: 2026-02-19\nOn 2026-01-05 we discussed the plan.";
        let date = find_context_date(text).unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 19).unwrap());
    }

    #[test]
    fn test_find_context_date_month_name() {
        let date = find_context_date("Notes from February 19, 2026").unwrap();
        assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2026, 2, 19).unwrap());
    }

    #[test]
    fn test_find_context_date_none_for_plain_text() {
        assert!(find_context_date("no dates here at all").is_none());
    }
}
