// Typed predicate tree compiled to a parameterized SQL WHERE clause.
// Literal content only ever reaches the database through bind values;
// the rendered SQL text contains nothing but column names, operators,
// and `$n` placeholders.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;

/// Text shape a score column must have before it is cast for a range
/// comparison. Rows that fail the shape check are filtered out instead
/// of aborting the whole query on an invalid cast.
pub(crate) const NUMERIC_SHAPE: &str = r"^-?[0-9]+(\.[0-9]+)?$";

/// A value bound to a `$n` placeholder, in render order.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Float(f64),
    Timestamp(DateTime<Utc>),
}

/// Column a predicate leaf applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Topic,
    Headline,
    Story,
    Category,
    BiasScore,
    QualityScore,
}

impl Field {
    pub fn column(self) -> &'static str {
        match self {
            Field::Topic => "topic",
            Field::Headline => "headline",
            Field::Story => "story",
            Field::Category => "category",
            Field::BiasScore => "bias_score",
            Field::QualityScore => "quality_score",
        }
    }
}

/// Strictness of a text match.
///
/// `Substring` is the interactive-search behavior: the term may occur
/// anywhere, case-insensitively. `WordBoundary` is the historical-search
/// behavior: the term must be delimited by string start/end, whitespace,
/// comma, or period on both sides. The two paths are intentionally
/// distinct and must stay that way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Substring,
    WordBoundary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The unconditional predicate; renders as TRUE.
    MatchAll,
    /// Case-insensitive text match on one column.
    Match {
        field: Field,
        mode: MatchMode,
        term: String,
    },
    /// Exact string equality on one column.
    Equals { field: Field, value: String },
    /// Inclusive range over a numeric-as-text score column.
    ScoreBetween { field: Field, min: f64, max: f64 },
    PublishedAfter(DateTime<Utc>),
    PublishedBefore(DateTime<Utc>),
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Render to SQL text plus the bind values referenced by its `$n`
    /// placeholders, numbered from 1 in render order.
    pub fn to_sql(&self) -> (String, Vec<BindValue>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        self.render(&mut sql, &mut binds);
        (sql, binds)
    }

    fn render(&self, sql: &mut String, binds: &mut Vec<BindValue>) {
        match self {
            Predicate::MatchAll => sql.push_str("TRUE"),
            Predicate::Match { field, mode, term } => {
                let (op, pattern) = match mode {
                    MatchMode::Substring => ("ILIKE", format!("%{}%", escape_like(term))),
                    MatchMode::WordBoundary => ("~*", boundary_pattern(term)),
                };
                binds.push(BindValue::Text(pattern));
                sql.push_str(&format!("{} {} ${}", field.column(), op, binds.len()));
            }
            Predicate::Equals { field, value } => {
                binds.push(BindValue::Text(value.clone()));
                sql.push_str(&format!("{} = ${}", field.column(), binds.len()));
            }
            Predicate::ScoreBetween { field, min, max } => {
                binds.push(BindValue::Float(*min));
                let lo = binds.len();
                binds.push(BindValue::Float(*max));
                let hi = binds.len();
                let col = field.column();
                sql.push_str(&format!(
                    "({col} ~ '{NUMERIC_SHAPE}' AND CAST({col} AS DOUBLE PRECISION) BETWEEN ${lo} AND ${hi})"
                ));
            }
            Predicate::PublishedAfter(t) => {
                binds.push(BindValue::Timestamp(*t));
                sql.push_str(&format!("published >= ${}", binds.len()));
            }
            Predicate::PublishedBefore(t) => {
                binds.push(BindValue::Timestamp(*t));
                sql.push_str(&format!("published <= ${}", binds.len()));
            }
            Predicate::All(parts) => render_group(parts, " AND ", "TRUE", sql, binds),
            Predicate::Any(parts) => render_group(parts, " OR ", "FALSE", sql, binds),
        }
    }
}

fn render_group(
    parts: &[Predicate],
    joiner: &str,
    empty: &str,
    sql: &mut String,
    binds: &mut Vec<BindValue>,
) {
    if parts.is_empty() {
        sql.push_str(empty);
        return;
    }
    sql.push('(');
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            sql.push_str(joiner);
        }
        part.render(sql, binds);
    }
    sql.push(')');
}

/// Escape LIKE wildcards so the term matches literally inside `%...%`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Build the word-boundary pattern: the term delimited by string
/// start/end, whitespace, comma, or period on both sides.
fn boundary_pattern(term: &str) -> String {
    format!("(^|[[:space:],.]){}([[:space:],.]|$)", regex::escape(term))
}

/// Apply bind values, in order, to a query whose SQL was produced by
/// `Predicate::to_sql` (optionally followed by extra placeholders the
/// caller binds itself).
pub(crate) fn bind_predicate<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    binds: &'q [BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for bind in binds {
        query = match bind {
            BindValue::Text(s) => query.bind(s.as_str()),
            BindValue::Float(f) => query.bind(*f),
            BindValue::Timestamp(t) => query.bind(*t),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn match_all_renders_true() {
        let (sql, binds) = Predicate::MatchAll.to_sql();
        assert_eq!(sql, "TRUE");
        assert!(binds.is_empty());
    }

    #[test]
    fn substring_match_wraps_and_escapes() {
        let p = Predicate::Match {
            field: Field::Headline,
            mode: MatchMode::Substring,
            term: "100%_sure".into(),
        };
        let (sql, binds) = p.to_sql();
        assert_eq!(sql, "headline ILIKE $1");
        assert_eq!(binds, vec![BindValue::Text("%100\\%\\_sure%".into())]);
    }

    #[test]
    fn boundary_match_escapes_regex_metacharacters() {
        let p = Predicate::Match {
            field: Field::Topic,
            mode: MatchMode::WordBoundary,
            term: "c++".into(),
        };
        let (sql, binds) = p.to_sql();
        assert_eq!(sql, "topic ~* $1");
        assert_eq!(
            binds,
            vec![BindValue::Text(
                r"(^|[[:space:],.])c\+\+([[:space:],.]|$)".into()
            )]
        );
    }

    #[test]
    fn score_between_guards_the_cast() {
        let p = Predicate::ScoreBetween {
            field: Field::QualityScore,
            min: 5.0,
            max: 9.5,
        };
        let (sql, binds) = p.to_sql();
        assert_eq!(
            sql,
            "(quality_score ~ '^-?[0-9]+(\\.[0-9]+)?$' AND CAST(quality_score AS DOUBLE PRECISION) BETWEEN $1 AND $2)"
        );
        assert_eq!(binds, vec![BindValue::Float(5.0), BindValue::Float(9.5)]);
    }

    #[test]
    fn placeholders_number_in_render_order() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let p = Predicate::All(vec![
            Predicate::Match {
                field: Field::Topic,
                mode: MatchMode::Substring,
                term: "ai".into(),
            },
            Predicate::Any(vec![
                Predicate::Equals {
                    field: Field::Category,
                    value: "science".into(),
                },
                Predicate::PublishedAfter(t),
            ]),
        ]);
        let (sql, binds) = p.to_sql();
        assert_eq!(
            sql,
            "(topic ILIKE $1 AND (category = $2 OR published >= $3))"
        );
        assert_eq!(binds.len(), 3);
        assert_eq!(binds[1], BindValue::Text("science".into()));
        assert_eq!(binds[2], BindValue::Timestamp(t));
    }

    #[test]
    fn empty_groups_degenerate_safely() {
        assert_eq!(Predicate::All(vec![]).to_sql().0, "TRUE");
        assert_eq!(Predicate::Any(vec![]).to_sql().0, "FALSE");
    }

    #[test]
    fn rendered_sql_never_contains_the_literal() {
        let p = Predicate::Match {
            field: Field::Story,
            mode: MatchMode::WordBoundary,
            term: "'; DROP TABLE articles; --".into(),
        };
        let (sql, _) = p.to_sql();
        assert!(!sql.contains("DROP"));
        assert_eq!(sql, "story ~* $1");
    }
}
