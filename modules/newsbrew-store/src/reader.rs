// Read side of the article store: compiled-predicate search with
// count + page-limited fetch, and the single-row retrieval paths.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use newsbrew_common::parse_score;

use crate::error::Result;
use crate::filter::{compile_historical, compile_search, HistoricalFilters};
use crate::page::{
    total_pages, Page, Pagination, HISTORICAL_PAGE_SIZE, SEARCH_PAGE_SIZE,
};
use crate::predicate::{bind_predicate, BindValue};

/// Column list for full article rows. Must stay in sync with the
/// fields of `Article`.
const ARTICLE_COLUMNS: &str = "id, headline, summary, story, haiku, published, topic, \
     cited, bias, bias_score, quality_score, category, review_status, \
     image_data, image_haiku";

/// A full article row. `link` is derived from configuration, not
/// stored.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub headline: String,
    pub summary: Option<String>,
    pub story: String,
    pub haiku: Option<String>,
    pub published: DateTime<Utc>,
    pub topic: Option<String>,
    pub cited: Option<serde_json::Value>,
    pub bias: Option<String>,
    pub bias_score: Option<String>,
    pub quality_score: Option<String>,
    pub category: Option<String>,
    pub review_status: Option<String>,
    pub image_data: Option<String>,
    pub image_haiku: Option<String>,
    #[sqlx(skip)]
    pub link: String,
}

/// Condensed row for the latest-articles feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: i64,
    pub headline: String,
    pub haiku: Option<String>,
    pub published: DateTime<Utc>,
    pub bias_score: Option<String>,
    pub quality_score: Option<String>,
    pub topic: Option<String>,
    pub category: Option<String>,
    pub link: String,
}

/// Subset row returned by historical search, with scores parsed to
/// numbers where they are numeric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalArticle {
    pub id: i64,
    pub headline: String,
    pub story: String,
    pub haiku: Option<String>,
    pub published: DateTime<Utc>,
    pub category: Option<String>,
    pub bias_score: Option<f64>,
    pub quality_score: Option<f64>,
    pub topic: Option<String>,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMetadata {
    pub total_results: i64,
    pub page_size: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalResults {
    pub articles: Vec<HistoricalArticle>,
    pub metadata: HistoricalMetadata,
}

/// Read-side wrapper around the article table.
#[derive(Clone)]
pub struct ArticleReader {
    pool: PgPool,
    article_base_url: String,
}

impl ArticleReader {
    pub fn new(pool: PgPool, article_base_url: String) -> Self {
        Self {
            pool,
            article_base_url,
        }
    }

    fn link_for(&self, id: i64) -> String {
        format!("{}{}", self.article_base_url, id)
    }

    fn with_link(&self, mut article: Article) -> Article {
        article.link = self.link_for(article.id);
        article
    }

    /// Interactive keyword search: substring matching, optional date
    /// bounds, small fixed page size.
    pub async fn search(
        &self,
        keywords: &str,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        page: Option<i64>,
    ) -> Result<SearchResults> {
        let predicate = compile_search(keywords, start_date, end_date);
        let (where_sql, binds) = predicate.to_sql();
        let page = Page::new(page, SEARCH_PAGE_SIZE);

        let total = self.count_where(&where_sql, &binds).await?;
        let articles = self.fetch_article_page(&where_sql, &binds, page).await?;

        Ok(SearchResults {
            articles,
            pagination: Pagination {
                current_page: page.number,
                total_pages: total_pages(total, page.size),
                total_articles: total,
                articles_per_page: page.size,
            },
        })
    }

    /// Historical search: word-boundary matching, structured filters,
    /// large fixed page size for bulk export.
    pub async fn historical(
        &self,
        keywords: &str,
        time_range: &str,
        filters: &HistoricalFilters,
    ) -> Result<HistoricalResults> {
        let predicate = compile_historical(keywords, time_range, filters, Utc::now());
        let (where_sql, binds) = predicate.to_sql();
        let page = Page::new(filters.page, HISTORICAL_PAGE_SIZE);

        let total = self.count_where(&where_sql, &binds).await?;

        let sql = format!(
            "SELECT id, headline, story, haiku, published, category, \
                    bias_score, quality_score, topic \
             FROM articles WHERE {where_sql} \
             ORDER BY published DESC, id DESC LIMIT ${} OFFSET ${}",
            binds.len() + 1,
            binds.len() + 2,
        );
        #[allow(clippy::type_complexity)]
        let rows: Vec<(
            i64,
            String,
            String,
            Option<String>,
            DateTime<Utc>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )> = bind_predicate(sqlx::query_as(&sql), &binds)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let articles = rows
            .into_iter()
            .map(|r| HistoricalArticle {
                id: r.0,
                headline: r.1,
                story: r.2,
                haiku: r.3,
                published: r.4,
                category: r.5,
                bias_score: parse_score(r.6.as_deref()),
                quality_score: parse_score(r.7.as_deref()),
                topic: r.8,
                link: self.link_for(r.0),
            })
            .collect();

        Ok(HistoricalResults {
            articles,
            metadata: HistoricalMetadata {
                total_results: total,
                page_size: page.size,
                current_page: page.number,
                total_pages: total_pages(total, page.size),
            },
        })
    }

    /// Fetch full rows for a set of ids, newest first.
    pub async fn by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE id = ANY($1) ORDER BY published DESC, id DESC"
        );
        let rows: Vec<Article> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|a| self.with_link(a)).collect())
    }

    /// Every article in publication order, condensed fields only.
    pub async fn latest(&self) -> Result<Vec<ArticleSummary>> {
        let rows: Vec<(
            i64,
            String,
            Option<String>,
            DateTime<Utc>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
        )> = sqlx::query_as(
            "SELECT id, headline, haiku, published, bias_score, quality_score, \
                    topic, category \
             FROM articles ORDER BY published DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ArticleSummary {
                id: r.0,
                headline: r.1,
                haiku: r.2,
                published: r.3,
                bias_score: r.4,
                quality_score: r.5,
                topic: r.6,
                category: r.7,
                link: self.link_for(r.0),
            })
            .collect())
    }

    /// The Nth most recent article (0-based).
    pub async fn by_index(&self, index: i64) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             ORDER BY published DESC, id DESC LIMIT 1 OFFSET $1"
        );
        let row: Option<Article> = sqlx::query_as(&sql)
            .bind(index.max(0))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|a| self.with_link(a)))
    }

    /// The most recent article still awaiting review.
    pub async fn next_unreviewed(&self) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE review_status IS NULL \
             ORDER BY published DESC, id DESC LIMIT 1"
        );
        let row: Option<Article> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|a| self.with_link(a)))
    }

    /// The most recent article with no haiku image yet.
    pub async fn next_missing_haiku_image(&self) -> Result<Option<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles \
             WHERE image_haiku IS NULL OR image_haiku = '' \
             ORDER BY published DESC, id DESC LIMIT 1"
        );
        let row: Option<Article> = sqlx::query_as(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|a| self.with_link(a)))
    }

    /// Dashboard snapshot over the whole table.
    pub async fn dashboard(&self) -> Result<crate::metrics::DashboardMetrics> {
        crate::metrics::dashboard_metrics(&self.pool).await
    }

    /// Word cloud over an optional publication window.
    pub async fn word_cloud(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<crate::wordcloud::WordCount>> {
        crate::wordcloud::word_cloud(&self.pool, start, end).await
    }

    async fn count_where(&self, where_sql: &str, binds: &[BindValue]) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM articles WHERE {where_sql}");
        let (total,): (i64,) = bind_predicate(sqlx::query_as(&sql), binds)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn fetch_article_page(
        &self,
        where_sql: &str,
        binds: &[BindValue],
        page: Page,
    ) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE {where_sql} \
             ORDER BY published DESC, id DESC LIMIT ${} OFFSET ${}",
            binds.len() + 1,
            binds.len() + 2,
        );
        let rows: Vec<Article> = bind_predicate(sqlx::query_as(&sql), binds)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|a| self.with_link(a)).collect())
    }
}
