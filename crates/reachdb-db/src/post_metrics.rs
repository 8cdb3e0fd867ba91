//! Database operations for the `posts` and `post_metrics` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub order_id: i64,
    pub kind: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Post metric record with post context, scoped to one business via the
/// posts→orders join.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostMetricRow {
    pub post: Uuid,
    pub kind: String,
    pub reach: Option<i64>,
    pub impressions: Option<i64>,
    pub engagement_rate: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a post published for an order and return the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post(
    pool: &PgPool,
    order_id: i64,
    kind: &str,
    published_at: Option<DateTime<Utc>>,
) -> Result<PostRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, PostRow>(
        "INSERT INTO posts (public_id, order_id, kind, published_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, public_id, order_id, kind, published_at",
    )
    .bind(public_id)
    .bind(order_id)
    .bind(kind)
    .bind(published_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Look up a post by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_post_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<PostRow>, DbError> {
    let row = sqlx::query_as::<_, PostRow>(
        "SELECT id, public_id, order_id, kind, published_at \
         FROM posts \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Record one measured performance snapshot for a post.
///
/// Returns the generated metric id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post_metric(
    pool: &PgPool,
    post_id: i64,
    reach: Option<i64>,
    impressions: Option<i64>,
    engagement_rate: Option<f64>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO post_metrics (post_id, reach, impressions, engagement_rate) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(post_id)
    .bind(reach)
    .bind(impressions)
    .bind(engagement_rate)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns all post metric records for a business via the posts→orders join.
///
/// This is the metric half of the dashboard snapshot; ordering is not
/// significant for aggregation but is kept stable for display.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_post_metrics_for_business(
    pool: &PgPool,
    business: Uuid,
) -> Result<Vec<PostMetricRow>, DbError> {
    let rows = sqlx::query_as::<_, PostMetricRow>(
        "SELECT \
             p.public_id AS post, \
             p.kind, \
             pm.reach, \
             pm.impressions, \
             pm.engagement_rate, \
             pm.captured_at \
         FROM post_metrics pm \
         JOIN posts p ON p.id = pm.post_id \
         JOIN orders o ON o.id = p.order_id \
         JOIN businesses b ON b.id = o.business_id \
         WHERE b.public_id = $1 \
         ORDER BY pm.captured_at DESC, pm.id DESC",
    )
    .bind(business)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
