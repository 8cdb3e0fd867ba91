use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reachdb_core::OrderStatus;
use reachdb_db::NewOrder;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, resolve_business, resolve_influencer, ApiError, ApiResponse,
    AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct OrderItem {
    pub id: Uuid,
    pub service: Option<String>,
    pub price: Option<Decimal>,
    pub status: String,
    pub influencer: Option<OrderInfluencer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderInfluencer {
    pub id: Uuid,
    pub handle: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct StatusItem {
    pub id: Uuid,
    pub status: OrderStatus,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct OrdersQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaceOrderRequest {
    pub business_id: Uuid,
    pub influencer_id: Option<Uuid>,
    pub service: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/businesses/{business_id}/orders — newest-first order list.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(business_id): Path<Uuid>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<ApiResponse<Vec<OrderItem>>>, ApiError> {
    resolve_business(&state, &req_id.0, business_id).await?;

    let rows = reachdb_db::list_orders_for_business(
        &state.pool,
        business_id,
        Some(normalize_limit(query.limit)),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| {
            let influencer = row.influencer.map(|id| OrderInfluencer {
                id,
                handle: row.influencer_handle.unwrap_or_default(),
                name: row.influencer_name.unwrap_or_default(),
            });
            OrderItem {
                id: row.public_id,
                service: row.service,
                price: row.price.map(|p| p.normalize()),
                status: row.status,
                influencer,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/orders — place an order with an influencer.
pub(super) async fn place_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderItem>>), ApiError> {
    let rid = &req_id.0;

    // Checked before any backend call; invalid input never reaches the store.
    if let Some(price) = body.price {
        if price <= Decimal::ZERO {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "price must be greater than zero",
            ));
        }
    }

    let business = resolve_business(&state, rid, body.business_id).await?;
    let influencer = match body.influencer_id {
        Some(id) => Some(resolve_influencer(&state, rid, id).await?),
        None => None,
    };

    let row = reachdb_db::insert_order(
        &state.pool,
        &NewOrder {
            business_id: business.id,
            influencer_id: influencer.as_ref().map(|i| i.id),
            service: body.service,
            price: body.price,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let item = OrderItem {
        id: row.public_id,
        service: row.service,
        price: row.price.map(|p| p.normalize()),
        status: row.status,
        influencer: influencer.map(|i| OrderInfluencer {
            id: i.public_id,
            handle: i.handle,
            name: i.name,
        }),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: item,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/orders/{order_id}/status — step the order lifecycle.
///
/// Marking an order paid also records the payment and credits the
/// influencer's wallet in one transaction.
pub(super) async fn update_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<StatusItem>>, ApiError> {
    let rid = &req_id.0;

    let order = reachdb_db::get_order_by_public_id(&state.pool, order_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "order not found"))?;

    let current: OrderStatus = order.status.parse().map_err(|e| {
        tracing::error!(order = %order.public_id, error = %e, "stored order status failed to parse");
        ApiError::new(rid, "internal_error", "order state is invalid")
    })?;

    let next = body.status;
    if !current.can_transition_to(next) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("cannot transition order from {current} to {next}"),
        ));
    }

    if next == OrderStatus::Paid {
        reachdb_db::mark_order_paid(&state.pool, &order).await
    } else {
        reachdb_db::update_order_status(&state.pool, order.id, current.as_str(), next.as_str())
            .await
    }
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: StatusItem {
            id: order.public_id,
            status: next,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
