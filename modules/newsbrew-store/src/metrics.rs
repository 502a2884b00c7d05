// Dashboard snapshot: independently computed statistics over the
// article table. No transaction spans the reads; each value is a
// point-in-time snapshot.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::Result;
use crate::sources::{source_rankings, SourceRank};
use crate::wordcloud::{word_cloud, WordCount};

/// Lookback for the dashboard's word cloud.
const WORD_CLOUD_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_articles: i64,
    pub approved_articles: i64,
    pub rejected_articles: i64,
    pub average_quality_score: Option<f64>,
    pub average_bias_score: Option<f64>,
    pub average_articles_per_day: Option<f64>,
    pub category_distribution: Vec<CategoryCount>,
    pub word_cloud_data: Vec<WordCount>,
    pub source_rankings: Vec<SourceRank>,
}

/// Compose the dashboard snapshot. An empty store yields zero counts,
/// absent averages, and empty distributions, never an error.
pub async fn dashboard_metrics(pool: &PgPool) -> Result<DashboardMetrics> {
    let week_ago = Utc::now() - Duration::days(WORD_CLOUD_DAYS);

    let (
        total_articles,
        approved_articles,
        rejected_articles,
        average_quality_score,
        average_bias_score,
        average_articles_per_day,
        category_distribution,
        word_cloud_data,
        source_rankings,
    ) = tokio::try_join!(
        count_all(pool),
        count_by_status(pool, "approved"),
        count_by_status(pool, "rejected"),
        average_score(pool, "quality_score"),
        average_score(pool, "bias_score"),
        average_per_day(pool),
        category_distribution(pool),
        word_cloud(pool, Some(week_ago), None),
        source_rankings(pool),
    )?;

    Ok(DashboardMetrics {
        total_articles,
        approved_articles,
        rejected_articles,
        average_quality_score,
        average_bias_score,
        average_articles_per_day,
        category_distribution,
        word_cloud_data,
        source_rankings,
    })
}

async fn count_all(pool: &PgPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

async fn count_by_status(pool: &PgPool, status: &str) -> Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM articles WHERE review_status = $1")
            .bind(status)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Average of a numeric-as-text score column, ignoring rows whose
/// value does not look like a number. NULL (None) when nothing
/// qualifies.
async fn average_score(pool: &PgPool, column: &'static str) -> Result<Option<f64>> {
    // Column names are hardcoded constants, not user input -- safe to interpolate.
    let sql = format!(
        r"SELECT AVG(CAST({column} AS DOUBLE PRECISION))
          FROM articles
          WHERE {column} ~ '^-?[0-9]+(\.[0-9]+)?$'"
    );
    let (avg,): (Option<f64>,) = sqlx::query_as(&sql).fetch_one(pool).await?;
    Ok(avg.map(round2))
}

/// Average number of articles published per calendar day, over the
/// days that saw at least one publication.
async fn average_per_day(pool: &PgPool) -> Result<Option<f64>> {
    let (avg,): (Option<f64>,) = sqlx::query_as(
        r#"
        SELECT AVG(articles_per_day)::DOUBLE PRECISION
        FROM (
            SELECT COUNT(*) AS articles_per_day
            FROM articles
            GROUP BY published::date
        ) daily_counts
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(avg.map(round2))
}

async fn category_distribution(pool: &PgPool) -> Result<Vec<CategoryCount>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT category, COUNT(*)
        FROM articles
        WHERE category IS NOT NULL AND category <> ''
        GROUP BY category
        ORDER BY COUNT(*) DESC, category ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
