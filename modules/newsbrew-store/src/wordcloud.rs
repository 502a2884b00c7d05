// Word-frequency aggregation over the topic column: tokenize,
// stop-word filter, count, rank.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::Result;
use crate::predicate::{bind_predicate, Predicate};

/// Words excluded from the cloud regardless of frequency.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "but", "with", "from", "has", "was",
    "are", "have", "had", "not", "its", "it's", "they", "their", "what",
    "about", "which", "when", "would", "there", "been", "could", "into",
    "than", "who", "will",
];

/// Maximum number of ranked words returned.
const MAX_WORDS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub text: String,
    pub value: i64,
}

/// Rank topic words across a row set.
///
/// Tokens are split on commas and whitespace and lowercased; tokens of
/// length <= 2, stop words, and words seen only once are discarded.
/// Sorted by frequency descending, then lexically ascending so equal
/// frequencies rank deterministically.
pub fn aggregate_topics<'a, I>(topics: I) -> Vec<WordCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, i64> = HashMap::new();
    for topic in topics {
        for token in topic.split(|c: char| c == ',' || c.is_whitespace()) {
            let word = token.to_lowercase();
            if word.chars().count() <= 2 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<WordCount> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(text, value)| WordCount { text, value })
        .collect();
    ranked.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.text.cmp(&b.text)));
    ranked.truncate(MAX_WORDS);
    ranked
}

/// Word cloud over the articles published inside the given bounds.
/// Absent bounds leave that side of the window unrestricted.
pub async fn word_cloud(
    pool: &PgPool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<WordCount>> {
    let mut parts = Vec::new();
    if let Some(start) = start {
        parts.push(Predicate::PublishedAfter(start));
    }
    if let Some(end) = end {
        parts.push(Predicate::PublishedBefore(end));
    }
    let (where_sql, binds) = Predicate::All(parts).to_sql();

    let sql =
        format!("SELECT topic FROM articles WHERE topic IS NOT NULL AND {where_sql}");
    let rows: Vec<(String,)> = bind_predicate(sqlx::query_as(&sql), &binds)
        .fetch_all(pool)
        .await?;

    Ok(aggregate_topics(rows.iter().map(|(topic,)| topic.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_commas_and_whitespace_and_lowercases() {
        let ranked = aggregate_topics(["Climate,Energy climate", "energy\tclimate"]);
        assert_eq!(
            ranked,
            vec![
                WordCount { text: "climate".into(), value: 3 },
                WordCount { text: "energy".into(), value: 2 },
            ]
        );
    }

    #[test]
    fn drops_short_tokens_and_stop_words() {
        let ranked = aggregate_topics(["the ai of and doom", "the ai and doom"]);
        assert_eq!(
            ranked,
            vec![WordCount { text: "doom".into(), value: 2 }]
        );
    }

    #[test]
    fn drops_words_seen_only_once() {
        let ranked = aggregate_topics(["fusion", "fission fusion"]);
        assert_eq!(
            ranked,
            vec![WordCount { text: "fusion".into(), value: 2 }]
        );
    }

    #[test]
    fn equal_frequencies_rank_lexically() {
        let ranked = aggregate_topics(["beta alpha", "alpha beta", "gamma gamma gamma"]);
        assert_eq!(
            ranked,
            vec![
                WordCount { text: "gamma".into(), value: 3 },
                WordCount { text: "alpha".into(), value: 2 },
                WordCount { text: "beta".into(), value: 2 },
            ]
        );
    }

    #[test]
    fn output_is_capped_at_one_hundred() {
        let mut corpus = Vec::new();
        for i in 0..150 {
            let word = format!("word{i:03}");
            corpus.push(format!("{word} {word}"));
        }
        let ranked = aggregate_topics(corpus.iter().map(String::as_str));
        assert_eq!(ranked.len(), 100);
    }

    #[test]
    fn every_result_satisfies_the_output_contract() {
        let ranked = aggregate_topics([
            "AI Policy, ai policy",
            "The The The",
            "ai xx yy",
        ]);
        for wc in &ranked {
            assert!(wc.text.chars().count() > 2);
            assert_eq!(wc.text, wc.text.to_lowercase());
            assert!(!STOP_WORDS.contains(&wc.text.as_str()));
            assert!(wc.value > 1);
        }
        let values: Vec<i64> = ranked.iter().map(|w| w.value).collect();
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(values, sorted);
    }
}
