pub mod error;
pub mod expression;
pub mod filter;
pub mod metrics;
pub mod page;
pub mod predicate;
pub mod reader;
pub mod sources;
pub mod wordcloud;
pub mod writer;

pub use error::{Result, StoreError};
pub use expression::{expression_predicate, parse_expression, Group};
pub use filter::{time_range_days, HistoricalFilters};
pub use metrics::{dashboard_metrics, CategoryCount, DashboardMetrics};
pub use page::{total_pages, Page, Pagination, HISTORICAL_PAGE_SIZE, SEARCH_PAGE_SIZE};
pub use predicate::{BindValue, Field, MatchMode, Predicate};
pub use reader::{
    Article, ArticleReader, ArticleSummary, HistoricalArticle, HistoricalMetadata,
    HistoricalResults, SearchResults,
};
pub use sources::{source_rankings, SourceRank};
pub use wordcloud::{word_cloud, WordCount};
pub use writer::ArticleWriter;

/// Run the embedded SQL migrations.
pub async fn migrate(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(e.into()))?;
    Ok(())
}
