// Citation domain ranking: extract the leading cited domain per
// article, rank by share of the total.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;

use crate::error::Result;

/// Maximum number of ranked domains returned.
const MAX_DOMAINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRank {
    pub domain: String,
    pub count: i64,
    pub percentage: f64,
}

/// Normalize a citation URL to its bare domain: scheme and a leading
/// "www." are stripped, and everything from the first remaining slash
/// onward is dropped.
pub fn extract_domain(url: &str) -> String {
    let without_scheme = url
        .split_once("//")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www
        .split('/')
        .next()
        .unwrap_or(without_www)
        .to_string()
}

/// Pull the first citation entry's URL out of a cited value. The
/// expected shape is a list of citation entries, each itself a list
/// whose first field is the URL; anything else is treated as malformed
/// and skipped rather than failing the aggregation.
pub fn first_cited_url(cited: &serde_json::Value) -> Option<&str> {
    cited.get(0)?.get(0)?.as_str()
}

/// Rank domains by count, attributing to each its percentage share of
/// all rows that yielded a domain (not of all articles). Equal counts
/// order lexically so the ranking is deterministic.
pub fn rank_domains<I>(domains: I) -> Vec<SourceRank>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, i64> = HashMap::new();
    let mut total: i64 = 0;
    for domain in domains {
        *counts.entry(domain).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<SourceRank> = counts
        .into_iter()
        .map(|(domain, count)| SourceRank {
            domain,
            count,
            percentage: round2(count as f64 * 100.0 / total as f64),
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(&b.domain)));
    ranked.truncate(MAX_DOMAINS);
    ranked
}

/// Rank citation domains across every article carrying citations.
pub async fn source_rankings(pool: &PgPool) -> Result<Vec<SourceRank>> {
    let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
        "SELECT cited FROM articles WHERE cited IS NOT NULL AND cited <> '[]'::jsonb",
    )
    .fetch_all(pool)
    .await?;

    Ok(rank_domains(rows.iter().filter_map(|(cited,)| {
        first_cited_url(cited).map(extract_domain)
    })))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
