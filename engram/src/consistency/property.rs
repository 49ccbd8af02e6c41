//! Property-signature matching for the lexical contradiction path.
//!
//! Two contents contradict when they describe the same canonical property of
//! the same owner but disagree on its value. The signature table is ordered:
//! the first matching rule names the property key.

use std::sync::LazyLock;

use regex::Regex;

struct SignatureRule {
    pattern: Regex,
    key: fn(&regex::Captures) -> String,
}

static SIGNATURE_RULES: LazyLock<Vec<SignatureRule>> = LazyLock::new(|| {
    fn favorite(caps: &regex::Captures) -> String {
        format!("favorite_{}", caps[1].to_lowercase())
    }
    fn location(_: &regex::Captures) -> String {
        "location".into()
    }
    fn workplace(_: &regex::Captures) -> String {
        "workplace".into()
    }
    fn revenue_target(_: &regex::Captures) -> String {
        "revenue_target".into()
    }
    fn budget(_: &regex::Captures) -> String {
        "budget".into()
    }
    fn team_size(_: &regex::Captures) -> String {
        "team_size".into()
    }
    fn salary(_: &regex::Captures) -> String {
        "salary".into()
    }
    fn customer_count(_: &regex::Captures) -> String {
        "customer_count".into()
    }
    fn employee_count(_: &regex::Captures) -> String {
        "employee_count".into()
    }
    fn generic_count(caps: &regex::Captures) -> String {
        format!("{}_count", caps[1].to_lowercase())
    }
    fn generic_target(caps: &regex::Captures) -> String {
        format!("{}_target", caps[1].to_lowercase())
    }

    vec![
        SignatureRule {
            pattern: Regex::new(r"(?i)\bfavou?rite (\w+)").unwrap(),
            key: favorite,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\b(?:lives in|living in|based in|moved to|relocated to)\b")
                .unwrap(),
            key: location,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\bworks (?:at|for)\b").unwrap(),
            key: workplace,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\brevenue (?:target|goal)\b").unwrap(),
            key: revenue_target,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\bbudget\b").unwrap(),
            key: budget,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\bteam (?:of|has|size)\b").unwrap(),
            key: team_size,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\bsalary\b").unwrap(),
            key: salary,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\bcustomers?\b").unwrap(),
            key: customer_count,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\b(?:employees|headcount)\b").unwrap(),
            key: employee_count,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\b(\w+) count\b").unwrap(),
            key: generic_count,
        },
        SignatureRule {
            pattern: Regex::new(r"(?i)\b(\w+) target\b").unwrap(),
            key: generic_target,
        },
    ]
});

static NUMERIC_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?\d[\d,]*(?:\.\d+)?\s*[kKmMbB]?\b%?").unwrap());

const UPDATE_INDICATORS: &[&str] = &[
    "now", "updated", "changed", "grew", "expanded", "increased", "decreased", "raised",
    "lowered", "moved", "switched", "became", "new",
];

/// The canonical property key this content describes, if any.
pub fn property_key(content: &str) -> Option<String> {
    SIGNATURE_RULES
        .iter()
        .find_map(|rule| rule.pattern.captures(content).map(|caps| (rule.key)(&caps)))
}

/// First numeric/monetary token in the content, normalized to a comparable
/// value. "$5M", "5,000,000" and "5000000" all compare equal.
pub fn numeric_token(content: &str) -> Option<f64> {
    let matched = NUMERIC_TOKEN.find(content)?;
    let raw = matched.as_str().trim();

    let mut multiplier = 1.0_f64;
    let mut digits = raw
        .trim_start_matches('$')
        .trim_end_matches('%')
        .trim()
        .to_string();
    digits.retain(|c| c != ',');

    if let Some(last) = digits.chars().last() {
        match last.to_ascii_lowercase() {
            'k' => multiplier = 1e3,
            'm' => multiplier = 1e6,
            'b' => multiplier = 1e9,
            _ => {}
        }
        if multiplier != 1.0 {
            digits.pop();
        }
    }

    digits.trim().parse::<f64>().ok().map(|v| v * multiplier)
}

fn has_update_indicator(content: &str) -> bool {
    content
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .any(|w| UPDATE_INDICATORS.contains(&w.as_str()))
}

/// Whether `new_content` contradicts `existing_content`. Both must map to the
/// same property key; then either their numeric tokens differ, or no numeric
/// comparison is possible and the new text carries an update indicator.
pub fn contradicts(new_content: &str, existing_content: &str) -> bool {
    let (Some(new_key), Some(existing_key)) =
        (property_key(new_content), property_key(existing_content))
    else {
        return false;
    };
    if new_key != existing_key {
        return false;
    }

    match (numeric_token(new_content), numeric_token(existing_content)) {
        (Some(new_value), Some(existing_value)) => (new_value - existing_value).abs() > f64::EPSILON,
        _ => has_update_indicator(new_content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_property_keys() {
        assert_eq!(
            property_key("User's favorite tea is oolong"),
            Some("favorite_tea".into())
        );
        assert_eq!(property_key("User lives in Lisbon"), Some("location".into()));
        assert_eq!(
            property_key("User works at Acme Corp"),
            Some("workplace".into())
        );
        assert_eq!(
            property_key("Revenue target is $5M"),
            Some("revenue_target".into())
        );
        assert_eq!(
            property_key("The sprint count is 14"),
            Some("sprint_count".into())
        );
        assert_eq!(property_key("User enjoys hiking"), None);
    }

    #[test]
    fn test_numeric_tokens_normalize() {
        assert_eq!(numeric_token("Revenue target is $5M"), Some(5_000_000.0));
        assert_eq!(numeric_token("Revenue target is 5,000,000"), Some(5_000_000.0));
        assert_eq!(numeric_token("budget is $50k"), Some(50_000.0));
        assert_eq!(numeric_token("grew 40%"), Some(40.0));
        assert_eq!(numeric_token("no numbers here"), None);
    }

    #[test]
    fn test_numeric_contradiction() {
        assert!(contradicts(
            "Revenue target is $6.2M",
            "Revenue target is $5M"
        ));
        assert!(!contradicts(
            "Revenue target is $5M",
            "Revenue target is 5,000,000"
        ));
    }

    #[test]
    fn test_update_indicator_contradiction() {
        assert!(contradicts(
            "User now works at Initech",
            "User works at Acme Corp"
        ));
        // no indicator and no numbers: not treated as a contradiction
        assert!(!contradicts(
            "User works at Initech",
            "User works at Acme Corp"
        ));
    }

    #[test]
    fn test_different_keys_never_contradict() {
        assert!(!contradicts(
            "User's favorite tea is oolong",
            "User's favorite city is Lisbon"
        ));
        assert!(!contradicts("User lives in Porto", "User works at Acme"));
    }
}
