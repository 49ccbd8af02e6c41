use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type Metadata = HashMap<String, serde_json::Value>;

/// Kind of fact extracted from content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    /// Factual information about the user or a named third party
    #[default]
    Fact,
    /// User preference or choice
    Preference,
    /// Dated occurrence (meeting, deadline, appointment)
    Event,
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fact => write!(f, "fact"),
            Self::Preference => write!(f, "preference"),
            Self::Event => write!(f, "event"),
        }
    }
}

impl std::str::FromStr for FactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fact" => Ok(Self::Fact),
            "preference" => Ok(Self::Preference),
            "event" => Ok(Self::Event),
            _ => Err(format!("Unknown fact kind: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_kind_default() {
        assert_eq!(FactKind::default(), FactKind::Fact);
    }

    #[test]
    fn test_fact_kind_display() {
        assert_eq!(FactKind::Fact.to_string(), "fact");
        assert_eq!(FactKind::Preference.to_string(), "preference");
        assert_eq!(FactKind::Event.to_string(), "event");
    }

    #[test]
    fn test_fact_kind_from_str() {
        assert_eq!("fact".parse::<FactKind>().unwrap(), FactKind::Fact);
        assert_eq!("FACT".parse::<FactKind>().unwrap(), FactKind::Fact);
        assert_eq!(
            "preference".parse::<FactKind>().unwrap(),
            FactKind::Preference
        );
        assert_eq!("Event".parse::<FactKind>().unwrap(), FactKind::Event);
        assert!("invalid".parse::<FactKind>().is_err());
    }

    #[test]
    fn test_fact_kind_serialization() {
        assert_eq!(serde_json::to_string(&FactKind::Fact).unwrap(), "\"fact\"");
        assert_eq!(
            serde_json::to_string(&FactKind::Preference).unwrap(),
            "\"preference\""
        );
        assert_eq!(
            serde_json::to_string(&FactKind::Event).unwrap(),
            "\"event\""
        );
    }

    #[test]
    fn test_fact_kind_deserialization() {
        let kind: FactKind = serde_json::from_str("\"event\"").unwrap();
        assert_eq!(kind, FactKind::Event);
    }
}
