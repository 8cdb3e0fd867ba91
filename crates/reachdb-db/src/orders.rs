//! Database operations for the `orders` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub public_id: Uuid,
    pub business_id: i64,
    pub influencer_id: Option<i64>,
    pub service: Option<String>,
    pub price: Option<Decimal>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order list row with influencer context, tailored for dashboard views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderListRow {
    pub public_id: Uuid,
    pub service: Option<String>,
    pub price: Option<Decimal>,
    pub status: String,
    pub influencer: Option<Uuid>,
    pub influencer_handle: Option<String>,
    pub influencer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for placing an order. Internal ids, resolved by the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub business_id: i64,
    pub influencer_id: Option<i64>,
    pub service: Option<String>,
    pub price: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all orders for a business, newest-first, with influencer context.
///
/// `limit` is `None` to return the full snapshot, or `Some(n)` to cap results.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_business(
    pool: &PgPool,
    business: Uuid,
    limit: Option<i64>,
) -> Result<Vec<OrderListRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderListRow>(
        "SELECT \
             o.public_id, \
             o.service, \
             o.price, \
             o.status, \
             i.public_id AS influencer, \
             i.handle    AS influencer_handle, \
             i.name      AS influencer_name, \
             o.created_at, \
             o.updated_at \
         FROM orders o \
         JOIN businesses b ON b.id = o.business_id \
         LEFT JOIN influencers i ON i.id = o.influencer_id \
         WHERE b.public_id = $1 \
         ORDER BY o.created_at DESC, o.id DESC \
         LIMIT COALESCE($2, 9223372036854775807)",
    )
    .bind(business)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Insert a new order in `pending` status and return the created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<OrderRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO orders (public_id, business_id, influencer_id, service, price) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, public_id, business_id, influencer_id, service, price, \
                   status, created_at, updated_at",
    )
    .bind(public_id)
    .bind(order.business_id)
    .bind(order.influencer_id)
    .bind(order.service.as_deref())
    .bind(order.price)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Look up an order by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(
        "SELECT id, public_id, business_id, influencer_id, service, price, \
                status, created_at, updated_at \
         FROM orders \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Transition an order's status, guarded against concurrent changes.
///
/// The update only applies while the row still carries `expected`; a
/// concurrent transition makes this a no-op.
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the row no longer carries `expected`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: i64,
    expected: &str,
    next: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE orders \
         SET status = $3, updated_at = NOW() \
         WHERE id = $1 AND status = $2",
    )
    .bind(order_id)
    .bind(expected)
    .bind(next)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus);
    }
    Ok(())
}

/// Mark a completed order as paid: transition the status, record the payment,
/// and credit the influencer's wallet, all in one transaction.
///
/// The payment amount is the order price (zero when the price is unset).
///
/// # Errors
///
/// Returns [`DbError::StaleStatus`] if the order is not currently `completed`,
/// or [`DbError::Sqlx`] if any statement fails.
pub async fn mark_order_paid(pool: &PgPool, order: &OrderRow) -> Result<(), DbError> {
    let amount = order.price.unwrap_or(Decimal::ZERO);
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE orders \
         SET status = 'paid', updated_at = NOW() \
         WHERE id = $1 AND status = 'completed'",
    )
    .bind(order.id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::StaleStatus);
    }

    sqlx::query("INSERT INTO payments (order_id, amount) VALUES ($1, $2)")
        .bind(order.id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;

    if let Some(influencer_id) = order.influencer_id {
        sqlx::query(
            "INSERT INTO wallets (influencer_id, balance) \
             VALUES ($1, $2) \
             ON CONFLICT (influencer_id) DO UPDATE SET \
                 balance    = wallets.balance + EXCLUDED.balance, \
                 updated_at = NOW()",
        )
        .bind(influencer_id)
        .bind(amount)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
