//! Declarative post-search filter evaluator.
//!
//! Conditions that cannot be evaluated (unknown key, unknown filter type,
//! type mismatch) FAIL OPEN: the condition counts as matching and the result
//! stays in. Availability over strictness; a malformed filter must never
//! empty out a query.

use serde_json::Value;

use crate::models::{FactSearchResult, FilterCondition, SearchFilters};

pub fn apply_filters(
    results: Vec<FactSearchResult>,
    filters: &SearchFilters,
) -> Vec<FactSearchResult> {
    results
        .into_iter()
        .filter(|r| matches_filters(r, filters))
        .collect()
}

pub fn matches_filters(result: &FactSearchResult, filters: &SearchFilters) -> bool {
    let object = match serde_json::to_value(result) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "Could not serialize result for filtering, failing open");
            return true;
        }
    };

    if let Some(and) = &filters.and {
        if !and.iter().all(|c| evaluate(&object, result, c)) {
            return false;
        }
    }
    if let Some(or) = &filters.or {
        if !or.is_empty() && !or.iter().any(|c| evaluate(&object, result, c)) {
            return false;
        }
    }
    true
}

fn evaluate(object: &Value, result: &FactSearchResult, condition: &FilterCondition) -> bool {
    let Some(resolved) = resolve_key(object, result, &condition.key) else {
        tracing::warn!(key = %condition.key, "Unknown filter key, failing open");
        return true;
    };

    let outcome = match effective_type(condition, &resolved) {
        FilterType::StringEqual => compare_strings(&resolved, condition, str::eq),
        FilterType::StringContains => {
            compare_strings(&resolved, condition, |haystack, needle| {
                haystack.contains(needle)
            })
        }
        FilterType::Numeric => compare_numeric(&resolved, condition),
        FilterType::ArrayContains => array_contains(&resolved, condition),
        FilterType::Unknown(ty) => {
            tracing::warn!(filter_type = %ty, "Unknown filter type, failing open");
            return true;
        }
    };

    match outcome {
        Some(matched) => {
            if condition.negate.unwrap_or(false) {
                !matched
            } else {
                matched
            }
        }
        None => {
            tracing::warn!(key = %condition.key, "Filter condition not evaluable, failing open");
            true
        }
    }
}

enum FilterType {
    StringEqual,
    StringContains,
    Numeric,
    ArrayContains,
    Unknown(String),
}

fn effective_type(condition: &FilterCondition, resolved: &Value) -> FilterType {
    match condition.filter_type.as_deref() {
        Some("string_equal") => FilterType::StringEqual,
        Some("string_contains") => FilterType::StringContains,
        Some("numeric") => FilterType::Numeric,
        Some("array_contains") => FilterType::ArrayContains,
        Some(other) => FilterType::Unknown(other.to_string()),
        // untyped conditions infer from the shapes involved
        None => match (resolved, &condition.value) {
            (Value::Array(_), _) => FilterType::ArrayContains,
            (Value::Number(_), Value::Number(_)) => FilterType::Numeric,
            _ => FilterType::StringEqual,
        },
    }
}

/// Field resolution order: top-level result field, then the metadata map,
/// then dot-notation traversal from the root object.
fn resolve_key(object: &Value, result: &FactSearchResult, key: &str) -> Option<Value> {
    if let Some(v) = object.get(key) {
        return Some(v.clone());
    }
    if let Some(v) = result.metadata.get(key) {
        return Some(v.clone());
    }
    if key.contains('.') {
        let mut current = object;
        let mut in_root = true;
        for part in key.split('.') {
            current = match current.get(part) {
                Some(v) => v,
                None if in_root => result.metadata.get(part)?,
                None => return None,
            };
            in_root = false;
        }
        return Some(current.clone());
    }
    None
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare_strings(
    resolved: &Value,
    condition: &FilterCondition,
    cmp: impl Fn(&str, &str) -> bool,
) -> Option<bool> {
    let left = as_string(resolved)?;
    let right = as_string(&condition.value)?;
    if condition.case_insensitive.unwrap_or(false) {
        Some(cmp(&left.to_lowercase(), &right.to_lowercase()))
    } else {
        Some(cmp(&left, &right))
    }
}

fn compare_numeric(resolved: &Value, condition: &FilterCondition) -> Option<bool> {
    let left = resolved.as_f64()?;
    let right = condition.value.as_f64()?;
    match condition.numeric_operator.as_deref().unwrap_or("==") {
        ">" => Some(left > right),
        ">=" => Some(left >= right),
        "<" => Some(left < right),
        "<=" => Some(left <= right),
        "==" | "=" => Some(left == right),
        "!=" => Some(left != right),
        other => {
            tracing::warn!(operator = %other, "Unknown numeric operator, failing open");
            None
        }
    }
}

fn array_contains(resolved: &Value, condition: &FilterCondition) -> Option<bool> {
    let items = resolved.as_array()?;
    let needle = as_string(&condition.value)?;
    let insensitive = condition.case_insensitive.unwrap_or(false);
    Some(items.iter().filter_map(as_string).any(|item| {
        if insensitive {
            item.to_lowercase() == needle.to_lowercase()
        } else {
            item == needle
        }
    }))
}
