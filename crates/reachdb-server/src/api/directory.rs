use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BusinessItem {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct InfluencerItem {
    pub id: Uuid,
    pub handle: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateBusinessRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateInfluencerRequest {
    pub handle: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct InfluencersQuery {
    pub limit: Option<i64>,
}

fn validate_name(req_id: &str, field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 200 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("{field} must be 1–200 characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

fn map_unique_violation(req_id: &str, e: &reachdb_db::DbError) -> ApiError {
    if let reachdb_db::DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(
                req_id,
                "conflict",
                "an influencer with that handle already exists",
            );
        }
    }
    map_db_error(req_id.to_owned(), e)
}

/// POST /api/v1/businesses — register a business account.
pub(super) async fn create_business(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateBusinessRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BusinessItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validate_name(rid, "name", &body.name)?;

    let row = reachdb_db::create_business(&state.pool, &name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: BusinessItem {
                id: row.public_id,
                name: row.name,
                created_at: row.created_at,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/v1/influencers — register an influencer profile.
pub(super) async fn create_influencer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateInfluencerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InfluencerItem>>), ApiError> {
    let rid = &req_id.0;
    let handle = validate_name(rid, "handle", &body.handle)?;
    let name = validate_name(rid, "name", &body.name)?;

    let row = reachdb_db::create_influencer(&state.pool, &handle, &name)
        .await
        .map_err(|e| map_unique_violation(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: InfluencerItem {
                id: row.public_id,
                handle: row.handle,
                name: row.name,
                created_at: row.created_at,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/influencers — the discovery listing, newest-first.
pub(super) async fn list_influencers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<InfluencersQuery>,
) -> Result<Json<ApiResponse<Vec<InfluencerItem>>>, ApiError> {
    let rows = reachdb_db::list_influencers(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| InfluencerItem {
            id: row.public_id,
            handle: row.handle,
            name: row.name,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
