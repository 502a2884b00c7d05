// Merges the keyword subtree with structured filters into one
// combined predicate.

use chrono::{DateTime, Duration, Utc};

use crate::expression::{expression_predicate, parse_expression};
use crate::predicate::{Field, MatchMode, Predicate};

/// Structured filters accepted by the historical search path.
#[derive(Debug, Clone, Default)]
pub struct HistoricalFilters {
    pub category: Option<String>,
    pub bias_range: Option<(f64, f64)>,
    pub quality_range: Option<(f64, f64)>,
    pub page: Option<i64>,
}

/// Fixed lookback table for symbolic time-range tokens. The "all"
/// token and anything unrecognized map to None: no time restriction.
/// Fail-open on bad tokens is deliberate, current behavior.
pub fn time_range_days(token: &str) -> Option<i64> {
    match token {
        "90d" => Some(90),
        "180d" => Some(180),
        "365d" => Some(365),
        "730d" => Some(730),
        "1825d" => Some(1825),
        _ => None,
    }
}

/// Compile the interactive-search predicate: substring keyword
/// matching plus optional publication date bounds.
pub fn compile_search(
    keywords: &str,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Predicate {
    let mut parts = Vec::new();
    if let Some(subtree) =
        expression_predicate(&parse_expression(keywords), MatchMode::Substring)
    {
        parts.push(subtree);
    }
    if let Some(start) = start_date {
        parts.push(Predicate::PublishedAfter(start));
    }
    if let Some(end) = end_date {
        parts.push(Predicate::PublishedBefore(end));
    }
    combine(parts)
}

/// Compile the historical-search predicate: word-boundary keyword
/// matching plus category, score ranges, and the time-range lookback.
pub fn compile_historical(
    keywords: &str,
    time_range: &str,
    filters: &HistoricalFilters,
    now: DateTime<Utc>,
) -> Predicate {
    let mut parts = Vec::new();
    if let Some(subtree) =
        expression_predicate(&parse_expression(keywords), MatchMode::WordBoundary)
    {
        parts.push(subtree);
    }
    if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
        parts.push(Predicate::Equals {
            field: Field::Category,
            value: category.to_string(),
        });
    }
    if let Some((min, max)) = filters.bias_range {
        parts.push(Predicate::ScoreBetween {
            field: Field::BiasScore,
            min,
            max,
        });
    }
    if let Some((min, max)) = filters.quality_range {
        parts.push(Predicate::ScoreBetween {
            field: Field::QualityScore,
            min,
            max,
        });
    }
    if let Some(days) = time_range_days(time_range) {
        parts.push(Predicate::PublishedAfter(now - Duration::days(days)));
    }
    combine(parts)
}

fn combine(parts: Vec<Predicate>) -> Predicate {
    if parts.is_empty() {
        Predicate::MatchAll
    } else {
        Predicate::All(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn token_table_is_fixed() {
        assert_eq!(time_range_days("90d"), Some(90));
        assert_eq!(time_range_days("180d"), Some(180));
        assert_eq!(time_range_days("365d"), Some(365));
        assert_eq!(time_range_days("730d"), Some(730));
        assert_eq!(time_range_days("1825d"), Some(1825));
    }

    #[test]
    fn all_and_unknown_tokens_fail_open() {
        assert_eq!(time_range_days("all"), None);
        assert_eq!(time_range_days("unknown-token"), None);
        assert_eq!(time_range_days("24h"), None);
        assert_eq!(time_range_days(""), None);
    }

    #[test]
    fn nothing_at_all_compiles_to_match_all() {
        let p = compile_historical("", "all", &HistoricalFilters::default(), now());
        assert_eq!(p, Predicate::MatchAll);
        assert_eq!(compile_search("", None, None), Predicate::MatchAll);
    }

    #[test]
    fn ninety_day_token_sets_a_lower_bound() {
        let p = compile_historical("", "90d", &HistoricalFilters::default(), now());
        let expected = now() - Duration::days(90);
        assert_eq!(p, Predicate::All(vec![Predicate::PublishedAfter(expected)]));
    }

    #[test]
    fn unknown_token_leaves_time_unrestricted() {
        let filters = HistoricalFilters {
            category: Some("science".into()),
            ..Default::default()
        };
        let p = compile_historical("", "unknown-token", &filters, now());
        assert_eq!(
            p,
            Predicate::All(vec![Predicate::Equals {
                field: Field::Category,
                value: "science".into(),
            }])
        );
    }

    #[test]
    fn filters_merge_under_and() {
        let filters = HistoricalFilters {
            category: Some("science".into()),
            bias_range: Some((-0.5, 0.5)),
            quality_range: Some((6.0, 10.0)),
            page: None,
        };
        let p = compile_historical("ai", "90d", &filters, now());
        let Predicate::All(parts) = p else {
            panic!("expected All");
        };
        // keyword subtree + category + two ranges + time bound
        assert_eq!(parts.len(), 5);
    }

    #[test]
    fn empty_category_is_ignored() {
        let filters = HistoricalFilters {
            category: Some(String::new()),
            ..Default::default()
        };
        let p = compile_historical("", "all", &filters, now());
        assert_eq!(p, Predicate::MatchAll);
    }

    #[test]
    fn search_date_bounds() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            compile_search("", Some(start), Some(end)),
            Predicate::All(vec![
                Predicate::PublishedAfter(start),
                Predicate::PublishedBefore(end),
            ])
        );
        assert_eq!(
            compile_search("", None, Some(end)),
            Predicate::All(vec![Predicate::PublishedBefore(end)])
        );
    }
}
