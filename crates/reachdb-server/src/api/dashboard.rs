use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use uuid::Uuid;

use reachdb_metrics::types::DashboardSummary;

use crate::middleware::RequestId;
use crate::refresh::load_summary;

use super::{map_refresh_error, resolve_business, ApiError, ApiResponse, AppState, ResponseMeta};

/// GET /api/v1/businesses/{business_id}/dashboard — point-in-time summary.
pub(super) async fn get_dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(business_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    resolve_business(&state, &req_id.0, business_id).await?;

    let summary = load_summary(&state.pool, business_id)
        .await
        .map_err(|e| map_refresh_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/businesses/{business_id}/dashboard/stream — live summary feed.
///
/// Holds the strong reference to the business's [`crate::realtime::DashboardFeed`]
/// for the lifetime of the client stream, so the change subscription is
/// released when the last viewer disconnects.
pub(super) async fn stream_dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(business_id): Path<Uuid>,
) -> Result<
    Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>,
    ApiError,
> {
    resolve_business(&state, &req_id.0, business_id).await?;

    let feed = state
        .feeds
        .get_or_spawn(&state.pool, business_id)
        .await
        .map_err(|e| {
            tracing::error!(business = %business_id, error = %e, "failed to start dashboard feed");
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                "failed to start dashboard feed",
            )
        })?;

    // Prime the channel so this subscriber starts from a current snapshot.
    feed.refresh().await;

    let updates = WatchStream::new(feed.subscribe());
    let stream = updates.filter_map(move |summary| {
        let _feed = &feed;
        summary
            .as_ref()
            .and_then(|s| Event::default().event("summary").json_data(s).ok())
            .map(Ok::<_, std::convert::Infallible>)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
