//! Database operations for the `businesses` and `influencers` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `businesses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BusinessRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `influencers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InfluencerRow {
    pub id: i64,
    pub public_id: Uuid,
    pub handle: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Insert a business account and return the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_business(pool: &PgPool, name: &str) -> Result<BusinessRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, BusinessRow>(
        "INSERT INTO businesses (public_id, name) \
         VALUES ($1, $2) \
         RETURNING id, public_id, name, created_at",
    )
    .bind(public_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Insert an influencer account and return the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including handle conflicts).
pub async fn create_influencer(
    pool: &PgPool,
    handle: &str,
    name: &str,
) -> Result<InfluencerRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, InfluencerRow>(
        "INSERT INTO influencers (public_id, handle, name) \
         VALUES ($1, $2, $3) \
         RETURNING id, public_id, handle, name, created_at",
    )
    .bind(public_id)
    .bind(handle)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List influencers for the discovery surface, newest-first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_influencers(pool: &PgPool, limit: i64) -> Result<Vec<InfluencerRow>, DbError> {
    let rows = sqlx::query_as::<_, InfluencerRow>(
        "SELECT id, public_id, handle, name, created_at \
         FROM influencers \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Look up a business by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_business_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<BusinessRow>, DbError> {
    let row = sqlx::query_as::<_, BusinessRow>(
        "SELECT id, public_id, name, created_at \
         FROM businesses \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Look up an influencer by their public UUID.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_influencer_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<InfluencerRow>, DbError> {
    let row = sqlx::query_as::<_, InfluencerRow>(
        "SELECT id, public_id, handle, name, created_at \
         FROM influencers \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
