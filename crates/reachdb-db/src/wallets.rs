//! Database operations for the `wallets` and `withdrawals` tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `wallets` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletRow {
    pub id: i64,
    pub influencer_id: i64,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `withdrawals` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WithdrawalRow {
    pub public_id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Get an influencer's wallet, creating an empty one if none exists yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn ensure_wallet(pool: &PgPool, influencer_id: i64) -> Result<WalletRow, DbError> {
    sqlx::query("INSERT INTO wallets (influencer_id) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(influencer_id)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, WalletRow>(
        "SELECT id, influencer_id, balance, updated_at \
         FROM wallets \
         WHERE influencer_id = $1",
    )
    .bind(influencer_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Get an influencer's wallet, or `None` if it was never funded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_wallet(pool: &PgPool, influencer_id: i64) -> Result<Option<WalletRow>, DbError> {
    let row = sqlx::query_as::<_, WalletRow>(
        "SELECT id, influencer_id, balance, updated_at \
         FROM wallets \
         WHERE influencer_id = $1",
    )
    .bind(influencer_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Credit an influencer's wallet, creating it on first payout.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn credit_wallet(
    pool: &PgPool,
    influencer_id: i64,
    amount: Decimal,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO wallets (influencer_id, balance) \
         VALUES ($1, $2) \
         ON CONFLICT (influencer_id) DO UPDATE SET \
             balance    = wallets.balance + EXCLUDED.balance, \
             updated_at = NOW()",
    )
    .bind(influencer_id)
    .bind(amount)
    .execute(pool)
    .await?;

    Ok(())
}

/// Debit the wallet and record the withdrawal in one transaction.
///
/// The debit is balance-guarded in SQL (`balance >= amount`), so a concurrent
/// spend can never overdraw even after the caller's synchronous validation
/// passed on a stale balance.
///
/// # Errors
///
/// Returns [`DbError::InsufficientFunds`] if the guarded debit matches no row,
/// [`DbError::NotFound`] if the influencer has no wallet, or [`DbError::Sqlx`]
/// if any statement fails.
pub async fn debit_wallet_and_record(
    pool: &PgPool,
    influencer_id: i64,
    amount: Decimal,
) -> Result<WithdrawalRow, DbError> {
    let mut tx = pool.begin().await?;

    let wallet_id: Option<i64> = sqlx::query_scalar(
        "UPDATE wallets \
         SET balance = balance - $2, updated_at = NOW() \
         WHERE influencer_id = $1 AND balance >= $2 \
         RETURNING id",
    )
    .bind(influencer_id)
    .bind(amount)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(wallet_id) = wallet_id else {
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM wallets WHERE influencer_id = $1")
                .bind(influencer_id)
                .fetch_optional(&mut *tx)
                .await?;
        return Err(if exists.is_some() {
            DbError::InsufficientFunds
        } else {
            DbError::NotFound
        });
    };

    let row = sqlx::query_as::<_, WithdrawalRow>(
        "INSERT INTO withdrawals (public_id, wallet_id, amount) \
         VALUES ($1, $2, $3) \
         RETURNING public_id, amount, status, requested_at",
    )
    .bind(Uuid::new_v4())
    .bind(wallet_id)
    .bind(amount)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// List an influencer's withdrawal requests, newest-first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_withdrawals(
    pool: &PgPool,
    influencer_id: i64,
    limit: i64,
) -> Result<Vec<WithdrawalRow>, DbError> {
    let rows = sqlx::query_as::<_, WithdrawalRow>(
        "SELECT w.public_id, w.amount, w.status, w.requested_at \
         FROM withdrawals w \
         JOIN wallets wa ON wa.id = w.wallet_id \
         WHERE wa.influencer_id = $1 \
         ORDER BY w.requested_at DESC, w.id DESC \
         LIMIT $2",
    )
    .bind(influencer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
