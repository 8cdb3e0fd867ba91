use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reachdb_core::PostKind;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct PostItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub kind: PostKind,
}

#[derive(Debug, Serialize)]
pub(super) struct MetricRecorded {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct PublishPostRequest {
    pub order_id: Uuid,
    pub kind: PostKind,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecordMetricRequest {
    pub reach: Option<i64>,
    pub impressions: Option<i64>,
    pub engagement_rate: Option<f64>,
}

fn validate_measurements(req_id: &str, body: &RecordMetricRequest) -> Result<(), ApiError> {
    if body.reach.is_some_and(|v| v < 0) || body.impressions.is_some_and(|v| v < 0) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "reach and impressions must not be negative",
        ));
    }
    if body
        .engagement_rate
        .is_some_and(|v| !v.is_finite() || v < 0.0)
    {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "engagement_rate must be a non-negative percentage",
        ));
    }
    Ok(())
}

/// POST /api/v1/posts — publish a post for a fulfilled order.
pub(super) async fn publish_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PublishPostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostItem>>), ApiError> {
    let rid = &req_id.0;

    let order = reachdb_db::get_order_by_public_id(&state.pool, body.order_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "order not found"))?;

    let row = reachdb_db::insert_post(&state.pool, order.id, body.kind.as_str(), body.published_at)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PostItem {
                id: row.public_id,
                order_id: order.public_id,
                kind: body.kind,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/v1/posts/{post_id}/metrics — record measured performance.
pub(super) async fn record_metric(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(post_id): Path<Uuid>,
    Json(body): Json<RecordMetricRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MetricRecorded>>), ApiError> {
    let rid = &req_id.0;
    validate_measurements(rid, &body)?;

    let post = reachdb_db::get_post_by_public_id(&state.pool, post_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "post not found"))?;

    let id = reachdb_db::insert_post_metric(
        &state.pool,
        post.id,
        body.reach,
        body.impressions,
        body.engagement_rate,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: MetricRecorded { id },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
