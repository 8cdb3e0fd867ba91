//! Database operations for the `notifications` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Notification with order context, as listed for a business.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub kind: String,
    pub message: String,
    pub order: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert a user-visible notification for a business, resolving the business
/// and optional order from their public UUIDs.
///
/// Returns the generated notification id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the business does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_notification(
    pool: &PgPool,
    business: Uuid,
    order: Option<Uuid>,
    kind: &str,
    message: &str,
) -> Result<i64, DbError> {
    let id: Option<i64> = sqlx::query_scalar(
        "INSERT INTO notifications (business_id, order_id, kind, message) \
         SELECT b.id, o.id, $3, $4 \
         FROM businesses b \
         LEFT JOIN orders o ON o.public_id = $2 \
         WHERE b.public_id = $1 \
         RETURNING id",
    )
    .bind(business)
    .bind(order)
    .bind(kind)
    .bind(message)
    .fetch_optional(pool)
    .await?;

    id.ok_or(DbError::NotFound)
}

/// List a business's notifications, newest-first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_notifications_for_business(
    pool: &PgPool,
    business: Uuid,
    limit: i64,
) -> Result<Vec<NotificationRow>, DbError> {
    let rows = sqlx::query_as::<_, NotificationRow>(
        "SELECT \
             n.id, \
             n.kind, \
             n.message, \
             o.public_id AS \"order\", \
             n.created_at \
         FROM notifications n \
         JOIN businesses b ON b.id = n.business_id \
         LEFT JOIN orders o ON o.id = n.order_id \
         WHERE b.public_id = $1 \
         ORDER BY n.created_at DESC, n.id DESC \
         LIMIT $2",
    )
    .bind(business)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
