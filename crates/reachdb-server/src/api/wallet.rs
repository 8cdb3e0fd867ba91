use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, resolve_influencer, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct WithdrawalItem {
    pub id: Uuid,
    pub amount: Decimal,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct WalletItem {
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
    pub withdrawals: Vec<WithdrawalItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct WithdrawalRequest {
    /// Raw user input; parsed and validated before anything is written.
    pub amount: String,
}

fn withdrawal_item(row: reachdb_db::WithdrawalRow) -> WithdrawalItem {
    WithdrawalItem {
        id: row.public_id,
        amount: row.amount.normalize(),
        status: row.status,
        requested_at: row.requested_at,
    }
}

/// GET /api/v1/influencers/{influencer_id}/wallet — balance and recent withdrawals.
pub(super) async fn get_wallet(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(influencer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WalletItem>>, ApiError> {
    let rid = &req_id.0;
    let influencer = resolve_influencer(&state, rid, influencer_id).await?;

    let wallet = reachdb_db::ensure_wallet(&state.pool, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let withdrawals = reachdb_db::list_withdrawals(&state.pool, influencer.id, 20)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: WalletItem {
            balance: wallet.balance.normalize(),
            updated_at: wallet.updated_at,
            withdrawals: withdrawals.into_iter().map(withdrawal_item).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/influencers/{influencer_id}/withdrawals — request a payout.
///
/// The amount is parsed and validated against the current balance before any
/// mutation is issued; the debit itself is additionally balance-guarded in
/// SQL so a concurrent spend cannot overdraw.
pub(super) async fn request_withdrawal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(influencer_id): Path<Uuid>,
    Json(body): Json<WithdrawalRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WithdrawalItem>>), ApiError> {
    let rid = &req_id.0;

    let amount = reachdb_core::parse_withdrawal_amount(&body.amount)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    let influencer = resolve_influencer(&state, rid, influencer_id).await?;

    let available = reachdb_db::get_wallet(&state.pool, influencer.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .map_or(Decimal::ZERO, |w| w.balance);

    reachdb_core::validate_withdrawal(amount, available)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    let row = reachdb_db::debit_wallet_and_record(&state.pool, influencer.id, amount)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: withdrawal_item(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
