use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, resolve_business, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct NotificationItem {
    pub id: i64,
    pub kind: String,
    pub message: String,
    pub order: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NotificationsQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/businesses/{business_id}/notifications — recent user-visible events.
pub(super) async fn list_notifications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationItem>>>, ApiError> {
    resolve_business(&state, &req_id.0, business_id).await?;

    let rows = reachdb_db::list_notifications_for_business(
        &state.pool,
        business_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| NotificationItem {
            id: row.id,
            kind: row.kind,
            message: row.message,
            order: row.order,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
