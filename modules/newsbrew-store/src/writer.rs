// Write side of the article store: publish and the single-row update
// operations. Updates are last-write-wins; there is no version check.

use sqlx::PgPool;
use tracing::info;

use newsbrew_common::{NewArticle, ReviewStatus, ReviewUpdates};

use crate::error::{Result, StoreError};

/// Write-side wrapper around the article table.
#[derive(Clone)]
pub struct ArticleWriter {
    pool: PgPool,
}

impl ArticleWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new article. The store assigns the id and stamps the
    /// publication time; both are immutable afterwards.
    pub async fn publish(&self, article: &NewArticle) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO articles
                (headline, summary, story, haiku, bias, bias_align, bias_score,
                 quality_score, cited, topic, category, image_data, image_haiku)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&article.headline)
        .bind(&article.summary)
        .bind(&article.story)
        .bind(&article.haiku)
        .bind(&article.bias)
        .bind(&article.bias_align)
        .bind(&article.bias_score)
        .bind(&article.quality_score)
        .bind(&article.cited)
        .bind(&article.topic)
        .bind(&article.category)
        .bind(&article.image_data)
        .bind(&article.image_haiku)
        .fetch_one(&self.pool)
        .await?;

        info!(article_id = id, "Published article");
        Ok(id)
    }

    /// Replace the image payload fields. Absent values clear the
    /// corresponding column.
    pub async fn update_images(
        &self,
        id: i64,
        image_data: Option<&str>,
        image_haiku: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE articles SET image_data = $1, image_haiku = $2 WHERE id = $3",
        )
        .bind(image_data)
        .bind(image_haiku)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!(article_id = id, "Updated article images");
        Ok(())
    }

    /// Record a review decision, stamping `reviewed_at`, and apply any
    /// accompanying field corrections. Only fields present in
    /// `updates` are written.
    pub async fn update_review(
        &self,
        id: i64,
        status: ReviewStatus,
        updates: &ReviewUpdates,
    ) -> Result<()> {
        let mut assignments = vec![
            "review_status = $1".to_string(),
            "reviewed_at = now()".to_string(),
        ];
        let mut values: Vec<&str> = Vec::new();

        let optional: [(&str, &Option<String>); 5] = [
            ("category", &updates.category),
            ("topic", &updates.topic),
            ("bias_score", &updates.bias_score),
            ("quality_score", &updates.quality_score),
            ("summary", &updates.summary),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                // Placeholder 1 is the status; id comes last.
                assignments.push(format!("{} = ${}", column, values.len() + 2));
                values.push(value);
            }
        }

        let sql = format!(
            "UPDATE articles SET {} WHERE id = ${}",
            assignments.join(", "),
            values.len() + 2,
        );

        let mut query = sqlx::query(&sql).bind(status.as_str());
        for value in values {
            query = query.bind(value);
        }
        let result = query.bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!(article_id = id, status = %status, "Updated review status");
        Ok(())
    }
}
