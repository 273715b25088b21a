//! Free-text search resolver.
//!
//! # Responsibility
//! - Disambiguate a single search box term into an id lookup and/or a
//!   case-insensitive username substring match.
//! - Compose that with an optional level filter into one `Filter` value.
//!
//! # Invariants
//! - A term that does not parse as a non-negative integer only drops the id
//!   clause; resolution never fails.
//! - Only the empty string counts as no term; whitespace is matched as-is.

use crate::model::student::{Level, StudentId};
use serde::Serialize;

/// Resolved query predicate over the student set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    MatchAll,
    ByLevel(Level),
    /// `id = id OR username ILIKE %term%`.
    ByTermOrId { term: String, id: Option<StudentId> },
    /// `(id = id OR username ILIKE %term%) AND level = level`.
    ByTermOrIdAndLevel {
        term: String,
        id: Option<StudentId>,
        level: Level,
    },
}

impl Filter {
    /// Level constraint carried by this filter, if any.
    pub fn level(&self) -> Option<Level> {
        match self {
            Self::ByLevel(level) | Self::ByTermOrIdAndLevel { level, .. } => Some(*level),
            Self::MatchAll | Self::ByTermOrId { .. } => None,
        }
    }
}

/// Resolves raw search input into a store filter.
pub fn resolve(term: Option<&str>, level: Option<Level>) -> Filter {
    let term = term.filter(|value| !value.is_empty());

    match (term, level) {
        (None, None) => Filter::MatchAll,
        (None, Some(level)) => Filter::ByLevel(level),
        (Some(term), None) => Filter::ByTermOrId {
            term: term.to_string(),
            id: parse_id(term),
        },
        (Some(term), Some(level)) => Filter::ByTermOrIdAndLevel {
            term: term.to_string(),
            id: parse_id(term),
            level,
        },
    }
}

/// Signed decimal parse; negative values are not ids.
fn parse_id(term: &str) -> Option<StudentId> {
    term.parse::<StudentId>().ok().filter(|id| *id >= 0)
}

#[cfg(test)]
mod tests {
    use super::{resolve, Filter};
    use crate::model::student::Level;

    #[test]
    fn empty_inputs_match_all() {
        assert_eq!(resolve(None, None), Filter::MatchAll);
        assert_eq!(resolve(Some(""), None), Filter::MatchAll);
    }

    #[test]
    fn whitespace_term_is_a_name_search() {
        assert_eq!(
            resolve(Some("   "), None),
            Filter::ByTermOrId {
                term: "   ".to_string(),
                id: None,
            }
        );
    }

    #[test]
    fn level_only_filters_by_level() {
        assert_eq!(
            resolve(Some(""), Some(Level::ThirdGrade)),
            Filter::ByLevel(Level::ThirdGrade)
        );
    }

    #[test]
    fn numeric_term_carries_id_clause() {
        assert_eq!(
            resolve(Some("7"), None),
            Filter::ByTermOrId {
                term: "7".to_string(),
                id: Some(7),
            }
        );
    }

    #[test]
    fn plus_signed_and_zero_terms_are_ids() {
        assert!(matches!(resolve(Some("+7"), None), Filter::ByTermOrId { id: Some(7), .. }));
        assert!(matches!(resolve(Some("0"), None), Filter::ByTermOrId { id: Some(0), .. }));
    }

    #[test]
    fn non_numeric_term_drops_id_clause() {
        for raw in ["jo", "-3", "7a", "3.0", " 12 "] {
            let filter = resolve(Some(raw), None);
            assert_eq!(
                filter,
                Filter::ByTermOrId {
                    term: raw.to_string(),
                    id: None,
                },
                "term `{raw}`"
            );
        }
    }

    #[test]
    fn overflowing_numeric_term_drops_id_clause() {
        let filter = resolve(Some("99999999999999999999"), None);
        assert!(matches!(filter, Filter::ByTermOrId { id: None, .. }));
    }

    #[test]
    fn term_and_level_combine() {
        let filter = resolve(Some("12"), Some(Level::Advanced));
        assert_eq!(
            filter,
            Filter::ByTermOrIdAndLevel {
                term: "12".to_string(),
                id: Some(12),
                level: Level::Advanced,
            }
        );
        assert_eq!(filter.level(), Some(Level::Advanced));
    }
}
