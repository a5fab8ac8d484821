//! Free-text search expression parsing
//!
//! ```text
//! expr  := token (WS token)*
//! token := field ':' value | value
//! field := all | question | questionSet | case | skill
//! ```
//!
//! Field names are case-insensitive. Bare tokens, tokens with an unknown
//! field and tokens with an empty value all land in [`QueryField::All`].
//! Parsing never fails.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Field prefix a token may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum QueryField {
    All,
    Question,
    #[strum(to_string = "questionSet")]
    QuestionSet,
    Case,
    Skill,
}

/// Keyword sets extracted from one expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    terms: HashMap<QueryField, BTreeSet<String>>,
}

impl ParsedQuery {
    /// Keywords routed to `field`: the shared `all` set plus the field's own
    pub fn keywords_for(&self, field: QueryField) -> BTreeSet<String> {
        let mut keywords = self.terms.get(&QueryField::All).cloned().unwrap_or_default();
        if field != QueryField::All {
            if let Some(own) = self.terms.get(&field) {
                keywords.extend(own.iter().cloned());
            }
        }
        keywords
    }

    /// Terms carrying exactly this prefix
    pub fn terms(&self, field: QueryField) -> Option<&BTreeSet<String>> {
        self.terms.get(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.values().all(BTreeSet::is_empty)
    }

    fn insert(&mut self, field: QueryField, value: &str) {
        self.terms
            .entry(field)
            .or_default()
            .insert(value.to_string());
    }
}

/// Splits a search expression into per-field keyword sets
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParser;

impl QueryParser {
    pub fn parse(expr: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();

        for token in expr.split_whitespace() {
            let routed = token.split_once(':').and_then(|(prefix, value)| {
                if value.is_empty() {
                    return None;
                }
                QueryField::from_str(prefix).ok().map(|field| (field, value))
            });

            match routed {
                Some((field, value)) => parsed.insert(field, value),
                None => parsed.insert(QueryField::All, token),
            }
        }

        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_routing() {
        let parsed = QueryParser::parse("go case:redis skill:mysql questionSet:interview");

        assert_eq!(parsed.keywords_for(QueryField::Question), set(&["go"]));
        assert_eq!(parsed.keywords_for(QueryField::Case), set(&["go", "redis"]));
        assert_eq!(parsed.keywords_for(QueryField::Skill), set(&["go", "mysql"]));
        assert_eq!(
            parsed.keywords_for(QueryField::QuestionSet),
            set(&["go", "interview"])
        );
    }

    #[test]
    fn test_field_names_ignore_case() {
        let parsed = QueryParser::parse("CASE:kafka QuestionSET:mq All:shared");

        assert_eq!(parsed.terms(QueryField::Case), Some(&set(&["kafka"])));
        assert_eq!(parsed.terms(QueryField::QuestionSet), Some(&set(&["mq"])));
        assert_eq!(parsed.keywords_for(QueryField::Skill), set(&["shared"]));
    }

    #[test]
    fn test_unknown_prefix_and_empty_value_stay_whole() {
        let parsed = QueryParser::parse("foo:bar case:");

        assert_eq!(parsed.terms(QueryField::All), Some(&set(&["foo:bar", "case:"])));
        assert!(parsed.terms(QueryField::Case).is_none());
    }

    #[test]
    fn test_only_first_colon_splits() {
        let parsed = QueryParser::parse("case:a:b");
        assert_eq!(parsed.terms(QueryField::Case), Some(&set(&["a:b"])));
    }

    #[test]
    fn test_empty_expression() {
        assert!(QueryParser::parse("").is_empty());
        assert!(QueryParser::parse(" \t\n ").is_empty());
        assert!(QueryParser::parse("").keywords_for(QueryField::Case).is_empty());
    }

    #[test]
    fn test_field_display() {
        assert_eq!(QueryField::QuestionSet.to_string(), "questionSet");
        assert_eq!(QueryField::Case.to_string(), "case");
    }
}
