// The keyword expression language: comma-separated groups, each
// classified into exactly one sub-form. No nesting beyond this one
// level; the classifier is a single pass with fixed precedence.

use crate::predicate::{Field, MatchMode, Predicate};

/// One comma-separated unit of a keyword expression.
///
/// Classification precedence is fixed: a group containing a pipe is an
/// OR-set even if it is also quoted or contains " AND "; a fully quoted
/// group is a phrase even if it contains " AND "; anything else with
/// " AND " is an AND-set; the rest are single terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    OrSet(Vec<String>),
    Phrase(String),
    AndSet(Vec<String>),
    Single(String),
}

/// Split a raw keyword string into classified groups. Empty input (or
/// input that is only commas and whitespace) yields no groups at all:
/// filters-only or unrestricted search is valid.
pub fn parse_expression(keywords: &str) -> Vec<Group> {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(classify_group)
        .collect()
}

fn classify_group(group: &str) -> Group {
    if group.contains('|') {
        Group::OrSet(split_terms(group, '|'))
    } else if let Some(inner) = quoted_inner(group) {
        Group::Phrase(inner.to_string())
    } else if group.contains(" AND ") {
        Group::AndSet(
            group
                .split(" AND ")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        Group::Single(group.to_string())
    }
}

fn split_terms(group: &str, sep: char) -> Vec<String> {
    group
        .split(sep)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn quoted_inner(group: &str) -> Option<&str> {
    group
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
}

/// A single term matched against the three searchable text fields,
/// OR-combined across them.
fn term_predicate(term: &str, mode: MatchMode) -> Predicate {
    Predicate::Any(
        [Field::Topic, Field::Headline, Field::Story]
            .into_iter()
            .map(|field| Predicate::Match {
                field,
                mode,
                term: term.to_string(),
            })
            .collect(),
    )
}

fn group_predicate(group: &Group, mode: MatchMode) -> Option<Predicate> {
    match group {
        Group::OrSet(terms) => {
            let parts: Vec<Predicate> =
                terms.iter().map(|t| term_predicate(t, mode)).collect();
            (!parts.is_empty()).then(|| Predicate::Any(parts))
        }
        Group::AndSet(terms) => {
            let parts: Vec<Predicate> =
                terms.iter().map(|t| term_predicate(t, mode)).collect();
            (!parts.is_empty()).then(|| Predicate::All(parts))
        }
        Group::Phrase(phrase) => {
            (!phrase.is_empty()).then(|| term_predicate(phrase, mode))
        }
        Group::Single(term) => Some(term_predicate(term, mode)),
    }
}

/// Compile classified groups into the keyword subtree: groups are
/// AND-combined. Returns None when there is nothing to match on.
pub fn expression_predicate(groups: &[Group], mode: MatchMode) -> Option<Predicate> {
    let parts: Vec<Predicate> = groups
        .iter()
        .filter_map(|g| group_predicate(g, mode))
        .collect();
    (!parts.is_empty()).then(|| Predicate::All(parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(parse_expression("").is_empty());
        assert!(parse_expression("  ,  , ").is_empty());
    }

    #[test]
    fn single_term() {
        assert_eq!(parse_expression("ai"), vec![Group::Single("ai".into())]);
    }

    #[test]
    fn pipe_splits_into_or_set() {
        assert_eq!(
            parse_expression("climate|weather"),
            vec![Group::OrSet(vec!["climate".into(), "weather".into()])]
        );
    }

    #[test]
    fn quoted_group_is_a_phrase() {
        assert_eq!(
            parse_expression("\"climate change\""),
            vec![Group::Phrase("climate change".into())]
        );
    }

    #[test]
    fn and_separator_splits_into_and_set() {
        assert_eq!(
            parse_expression("solar AND wind"),
            vec![Group::AndSet(vec!["solar".into(), "wind".into()])]
        );
    }

    #[test]
    fn pipe_takes_precedence_over_quotes_and_and() {
        assert_eq!(
            parse_expression("\"a|b\""),
            vec![Group::OrSet(vec!["\"a".into(), "b\"".into()])]
        );
        assert_eq!(
            parse_expression("x AND y|z"),
            vec![Group::OrSet(vec!["x AND y".into(), "z".into()])]
        );
    }

    #[test]
    fn quotes_take_precedence_over_and() {
        assert_eq!(
            parse_expression("\"war AND peace\""),
            vec![Group::Phrase("war AND peace".into())]
        );
    }

    #[test]
    fn lowercase_and_is_a_single_term() {
        assert_eq!(
            parse_expression("bread and butter"),
            vec![Group::Single("bread and butter".into())]
        );
    }

    #[test]
    fn classification_is_per_group() {
        let groups = parse_expression("ai, climate|weather");
        assert_eq!(
            groups,
            vec![
                Group::Single("ai".into()),
                Group::OrSet(vec!["climate".into(), "weather".into()]),
            ]
        );
    }

    #[test]
    fn two_group_expression_compiles_to_and_of_or() {
        let groups = parse_expression("ai, climate|weather");
        let predicate = expression_predicate(&groups, MatchMode::WordBoundary).unwrap();
        let (sql, binds) = predicate.to_sql();
        // Group 1: "ai" across three fields; group 2: OR of two terms,
        // each across three fields. 3 + 6 patterns in total.
        assert_eq!(binds.len(), 9);
        let ands = sql.matches(" AND ").count();
        assert_eq!(ands, 1, "groups are AND-combined exactly once: {sql}");
        assert!(sql.contains("topic ~* $1"));
        assert!(sql.contains("topic ~* $4"));
    }

    #[test]
    fn empty_expression_compiles_to_none() {
        assert_eq!(
            expression_predicate(&parse_expression(""), MatchMode::Substring),
            None
        );
    }

    #[test]
    fn empty_or_terms_are_dropped() {
        assert_eq!(
            parse_expression("a||b"),
            vec![Group::OrSet(vec!["a".into(), "b".into()])]
        );
        // A group of only separators has no usable terms and compiles away.
        let groups = parse_expression("|");
        assert_eq!(groups, vec![Group::OrSet(vec![])]);
        assert_eq!(expression_predicate(&groups, MatchMode::Substring), None);
    }
}
