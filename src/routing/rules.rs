//! Table rules and their parsing.
//!
//! # Responsibilities
//! - Parse the whitespace-delimited `table destination` list
//! - Preserve configured order (it is the match priority)
//! - Reject table names that cannot be embedded in a query
//!
//! # Design Decisions
//! - Duplicate tables are accepted; only the first one can ever match
//! - Parsing is all-or-nothing: a malformed list yields no rules at all

use serde::Serialize;
use thiserror::Error;

use crate::store::is_valid_identifier;

/// A single (table, destination) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Table whose identity column is checked.
    pub table: String,
    /// Destination prefix substituted for the location on a match.
    pub destination: String,
}

impl Rule {
    pub fn new(table: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            destination: destination.into(),
        }
    }
}

/// Error raised while parsing a rule list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("table list has an odd number of tokens ({0}); expected `table destination` pairs")]
    OddTokenCount(usize),

    #[error("table name `{0}` is not a valid identifier")]
    InvalidTable(String),

    #[error("destination `{destination}` for table `{table}` must start with '/'")]
    InvalidDestination { table: String, destination: String },
}

/// Ordered, immutable rule sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build a rule set from already-validated rules, keeping their order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse `"t1 /dir.2 t2 /dir.3"` into `[(t1, /dir.2), (t2, /dir.3)]`.
    pub fn parse(text: &str) -> Result<Self, RuleParseError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(RuleParseError::OddTokenCount(tokens.len()));
        }

        let mut rules = Vec::with_capacity(tokens.len() / 2);
        for pair in tokens.chunks_exact(2) {
            let (table, destination) = (pair[0], pair[1]);
            if !is_valid_identifier(table) {
                return Err(RuleParseError::InvalidTable(table.to_string()));
            }
            if !destination.starts_with('/') {
                return Err(RuleParseError::InvalidDestination {
                    table: table.to_string(),
                    destination: destination.to_string(),
                });
            }
            rules.push(Rule::new(table, destination));
        }

        Ok(Self { rules })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order() {
        let rules = RuleSet::parse("t1 /dir.2\n  t2\t/dir.3").unwrap();
        let pairs: Vec<_> = rules
            .iter()
            .map(|r| (r.table.as_str(), r.destination.as_str()))
            .collect();
        assert_eq!(pairs, vec![("t1", "/dir.2"), ("t2", "/dir.3")]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(RuleSet::parse("").unwrap().is_empty());
        assert!(RuleSet::parse("   \n ").unwrap().is_empty());
    }

    #[test]
    fn test_odd_token_count_rejected() {
        assert_eq!(
            RuleSet::parse("t1 /dir.2 t2"),
            Err(RuleParseError::OddTokenCount(3))
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let rules = RuleSet::parse("staff /a staff /b").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.iter().next().unwrap().destination, "/a");
    }

    #[test]
    fn test_injection_in_table_name_rejected() {
        assert_eq!(
            RuleSet::parse("users;drop /x"),
            Err(RuleParseError::InvalidTable("users;drop".to_string()))
        );
    }

    #[test]
    fn test_relative_destination_rejected() {
        assert!(matches!(
            RuleSet::parse("t1 dir.2"),
            Err(RuleParseError::InvalidDestination { .. })
        ));
    }
}
