mod dashboard;
mod directory;
mod notifications;
mod orders;
mod posts;
mod wallet;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::realtime::FeedRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub feeds: FeedRegistry,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &reachdb_db::DbError) -> ApiError {
    use reachdb_db::DbError;

    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::StaleStatus => ApiError::new(
            request_id,
            "conflict",
            "order status changed concurrently",
        ),
        DbError::InsufficientFunds => ApiError::new(
            request_id,
            "validation_error",
            "withdrawal amount exceeds available balance",
        ),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_refresh_error(
    request_id: String,
    error: &crate::refresh::RefreshError,
) -> ApiError {
    match error {
        crate::refresh::RefreshError::Db(e) => map_db_error(request_id, e),
        crate::refresh::RefreshError::Core(e) => {
            tracing::error!(error = %e, "stored row failed domain conversion");
            ApiError::new(request_id, "internal_error", "dashboard refresh failed")
        }
    }
}

/// Resolve a business public UUID or fail the request with 404.
pub(super) async fn resolve_business(
    state: &AppState,
    request_id: &str,
    business: Uuid,
) -> Result<reachdb_db::BusinessRow, ApiError> {
    match reachdb_db::get_business_by_public_id(&state.pool, business).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(ApiError::new(request_id, "not_found", "business not found")),
        Err(e) => Err(map_db_error(request_id.to_owned(), &e)),
    }
}

/// Resolve an influencer public UUID or fail the request with 404.
pub(super) async fn resolve_influencer(
    state: &AppState,
    request_id: &str,
    influencer: Uuid,
) -> Result<reachdb_db::InfluencerRow, ApiError> {
    match reachdb_db::get_influencer_by_public_id(&state.pool, influencer).await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(ApiError::new(
            request_id,
            "not_found",
            "influencer not found",
        )),
        Err(e) => Err(map_db_error(request_id.to_owned(), &e)),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/businesses",
            post(directory::create_business),
        )
        .route(
            "/api/v1/businesses/{business_id}/dashboard",
            get(dashboard::get_dashboard),
        )
        .route(
            "/api/v1/businesses/{business_id}/dashboard/stream",
            get(dashboard::stream_dashboard),
        )
        .route(
            "/api/v1/businesses/{business_id}/orders",
            get(orders::list_orders),
        )
        .route(
            "/api/v1/businesses/{business_id}/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/v1/influencers",
            get(directory::list_influencers).post(directory::create_influencer),
        )
        .route(
            "/api/v1/influencers/{influencer_id}/wallet",
            get(wallet::get_wallet),
        )
        .route(
            "/api/v1/influencers/{influencer_id}/withdrawals",
            post(wallet::request_withdrawal),
        )
        .route("/api/v1/orders", post(orders::place_order))
        .route(
            "/api/v1/orders/{order_id}/status",
            patch(orders::update_status),
        )
        .route("/api/v1/posts", post(posts::publish_post))
        .route(
            "/api/v1/posts/{post_id}/metrics",
            post(posts::record_metric),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match reachdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::orders::OrderItem;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        build_app(
            AppState {
                pool,
                feeds: FeedRegistry::default(),
            },
            auth,
            default_rate_limit_state(),
        )
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        (status, json)
    }

    async fn send_json(
        app: Router,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json parse");
        (status, json)
    }

    // -------------------------------------------------------------------------
    // Unit tests (no DB)
    // -------------------------------------------------------------------------

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_insufficient_funds_maps_to_validation_error() {
        let error = map_db_error("req-2".to_string(), &reachdb_db::DbError::InsufficientFunds);
        assert_eq!(error.error.code, "validation_error");
    }

    #[test]
    fn order_item_is_serializable() {
        // Proves the type compiles and serde works — no DB needed.
        let item = OrderItem {
            id: Uuid::new_v4(),
            service: Some("sponsored reel".to_string()),
            price: Some(dec("125000")),
            status: "pending".to_string(),
            influencer: Some(super::orders::OrderInfluencer {
                id: Uuid::new_v4(),
                handle: "@fizz".to_string(),
                name: "Fizz".to_string(),
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"status\":\"pending\""));
        assert!(json.contains("\"price\":\"125000\""));
    }

    // -------------------------------------------------------------------------
    // Dashboard — integration tests (with DB)
    // -------------------------------------------------------------------------

    async fn seed_dashboard_scenario(pool: &sqlx::PgPool) -> reachdb_db::BusinessRow {
        let business = reachdb_db::create_business(pool, "Acme Drinks")
            .await
            .expect("create business");
        let a = reachdb_db::create_influencer(pool, "creator-a", "Creator A")
            .await
            .expect("create influencer a");
        let b = reachdb_db::create_influencer(pool, "creator-b", "Creator B")
            .await
            .expect("create influencer b");

        let completed = reachdb_db::insert_order(
            pool,
            &reachdb_db::NewOrder {
                business_id: business.id,
                influencer_id: Some(a.id),
                service: Some("campaign".to_string()),
                price: Some(dec("125000")),
            },
        )
        .await
        .expect("insert completed order");
        reachdb_db::update_order_status(pool, completed.id, "pending", "approved")
            .await
            .expect("approve");
        reachdb_db::update_order_status(pool, completed.id, "approved", "completed")
            .await
            .expect("complete");

        reachdb_db::insert_order(
            pool,
            &reachdb_db::NewOrder {
                business_id: business.id,
                influencer_id: Some(b.id),
                service: Some("campaign".to_string()),
                price: Some(dec("158000")),
            },
        )
        .await
        .expect("insert pending order");

        let reel = reachdb_db::insert_post(pool, completed.id, "reel", None)
            .await
            .expect("insert reel");
        let video = reachdb_db::insert_post(pool, completed.id, "video", None)
            .await
            .expect("insert video");
        reachdb_db::insert_post_metric(pool, reel.id, Some(40_000), Some(60_000), Some(5.0))
            .await
            .expect("reel metric");
        reachdb_db::insert_post_metric(pool, video.id, Some(10_000), Some(12_000), Some(3.0))
            .await
            .expect("video metric");

        business
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn dashboard_summary_matches_seeded_scenario(pool: sqlx::PgPool) {
        let business = seed_dashboard_scenario(&pool).await;

        let uri = format!("/api/v1/businesses/{}/dashboard", business.public_id);
        let (status, json) = get_json(test_app(pool), &uri).await;

        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["total_spent"].as_str(), Some("283000"));
        assert_eq!(data["total_orders"].as_u64(), Some(2));
        assert_eq!(data["completed_campaigns"].as_u64(), Some(1));
        assert_eq!(data["active_requests"].as_u64(), Some(1));
        assert_eq!(data["connected_influencers"].as_u64(), Some(2));
        assert_eq!(data["total_reach"].as_u64(), Some(50_000));
        assert!(
            (data["avg_engagement_rate"].as_f64().unwrap() - 4.0).abs() < 1e-9,
            "avg engagement should be 4.0"
        );
        assert_eq!(data["post_stats"]["total"].as_u64(), Some(2));
        assert_eq!(data["post_stats"]["reels"].as_u64(), Some(1));
        assert_eq!(data["post_stats"]["videos"].as_u64(), Some(1));
        assert_eq!(data["post_stats"]["shorts"].as_u64(), Some(0));
        // 0.35*4.0 + 0.25*50 + 0.15*50 + 0.10*50 + 0.15*50 = 33.9 → 34
        assert_eq!(data["impact_score"].as_u64(), Some(34));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn dashboard_for_unknown_business_is_404(pool: sqlx::PgPool) {
        let uri = format!("/api/v1/businesses/{}/dashboard", Uuid::new_v4());
        let (status, json) = get_json(test_app(pool), &uri).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"].as_str(), Some("not_found"));
    }

    // -------------------------------------------------------------------------
    // Orders — integration tests (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn place_order_then_list_shows_it_newest_first(pool: sqlx::PgPool) {
        let business = reachdb_db::create_business(&pool, "Acme")
            .await
            .expect("create business");
        let influencer = reachdb_db::create_influencer(&pool, "fizz", "Fizz")
            .await
            .expect("create influencer");

        let (status, json) = send_json(
            test_app(pool.clone()),
            "POST",
            "/api/v1/orders",
            serde_json::json!({
                "business_id": business.public_id,
                "influencer_id": influencer.public_id,
                "service": "sponsored reel",
                "price": "125000",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "body: {json}");
        assert_eq!(json["data"]["status"].as_str(), Some("pending"));

        let uri = format!("/api/v1/businesses/{}/orders", business.public_id);
        let (status, json) = get_json(test_app(pool), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["status"].as_str(), Some("pending"));
        assert_eq!(data[0]["influencer"]["handle"].as_str(), Some("fizz"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn place_order_rejects_non_positive_price(pool: sqlx::PgPool) {
        let business = reachdb_db::create_business(&pool, "Acme")
            .await
            .expect("create business");

        let (status, json) = send_json(
            test_app(pool),
            "POST",
            "/api/v1/orders",
            serde_json::json!({
                "business_id": business.public_id,
                "price": "0",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn order_lifecycle_pays_the_influencer_wallet(pool: sqlx::PgPool) {
        let business = reachdb_db::create_business(&pool, "Acme")
            .await
            .expect("create business");
        let influencer = reachdb_db::create_influencer(&pool, "glow", "Glow")
            .await
            .expect("create influencer");
        let order = reachdb_db::insert_order(
            &pool,
            &reachdb_db::NewOrder {
                business_id: business.id,
                influencer_id: Some(influencer.id),
                service: None,
                price: Some(dec("750.25")),
            },
        )
        .await
        .expect("insert order");

        let uri = format!("/api/v1/orders/{}/status", order.public_id);
        for next in ["approved", "completed", "paid"] {
            let (status, json) = send_json(
                test_app(pool.clone()),
                "PATCH",
                &uri,
                serde_json::json!({ "status": next }),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "transition to {next}: {json}");
            assert_eq!(json["data"]["status"].as_str(), Some(next));
        }

        let wallet_uri = format!("/api/v1/influencers/{}/wallet", influencer.public_id);
        let (status, json) = get_json(test_app(pool), &wallet_uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["balance"].as_str(), Some("750.25"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn illegal_status_transition_is_rejected(pool: sqlx::PgPool) {
        let business = reachdb_db::create_business(&pool, "Acme")
            .await
            .expect("create business");
        let order = reachdb_db::insert_order(
            &pool,
            &reachdb_db::NewOrder {
                business_id: business.id,
                influencer_id: None,
                service: None,
                price: None,
            },
        )
        .await
        .expect("insert order");

        let uri = format!("/api/v1/orders/{}/status", order.public_id);
        let (status, json) = send_json(
            test_app(pool),
            "PATCH",
            &uri,
            serde_json::json!({ "status": "paid" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    // -------------------------------------------------------------------------
    // Wallet — integration tests (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn withdrawal_validation_runs_before_any_mutation(pool: sqlx::PgPool) {
        let influencer = reachdb_db::create_influencer(&pool, "spark", "Spark")
            .await
            .expect("create influencer");
        reachdb_db::credit_wallet(&pool, influencer.id, dec("100"))
            .await
            .expect("credit");

        let uri = format!("/api/v1/influencers/{}/withdrawals", influencer.public_id);

        let (status, json) = send_json(
            test_app(pool.clone()),
            "POST",
            &uri,
            serde_json::json!({ "amount": "ten dollars" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));

        let (status, _) = send_json(
            test_app(pool.clone()),
            "POST",
            &uri,
            serde_json::json!({ "amount": "100.01" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send_json(
            test_app(pool.clone()),
            "POST",
            &uri,
            serde_json::json!({ "amount": "40" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "body: {json}");
        assert_eq!(json["data"]["amount"].as_str(), Some("40"));
        assert_eq!(json["data"]["status"].as_str(), Some("pending"));

        let wallet_uri = format!("/api/v1/influencers/{}/wallet", influencer.public_id);
        let (status, json) = get_json(test_app(pool), &wallet_uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["balance"].as_str(), Some("60"));
        assert_eq!(
            json["data"]["withdrawals"].as_array().map(Vec::len),
            Some(1)
        );
    }

    // -------------------------------------------------------------------------
    // Notifications — integration tests (with DB)
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn notifications_list_returns_recent_events(pool: sqlx::PgPool) {
        let business = reachdb_db::create_business(&pool, "Acme")
            .await
            .expect("create business");
        reachdb_db::insert_notification(
            &pool,
            business.public_id,
            None,
            "system",
            "Welcome to the marketplace",
        )
        .await
        .expect("insert notification");

        let uri = format!("/api/v1/businesses/{}/notifications", business.public_id);
        let (status, json) = get_json(test_app(pool), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["kind"].as_str(), Some("system"));
    }

    // -------------------------------------------------------------------------
    // Directory & health
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn influencer_discovery_lists_created_profiles(pool: sqlx::PgPool) {
        let (status, json) = send_json(
            test_app(pool.clone()),
            "POST",
            "/api/v1/influencers",
            serde_json::json!({ "handle": "fizz", "name": "Fizz" }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "body: {json}");

        let (status, json) = get_json(test_app(pool), "/api/v1/influencers").await;
        assert_eq!(status, StatusCode::OK);
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["handle"].as_str(), Some("fizz"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_with_live_database(pool: sqlx::PgPool) {
        let (status, json) = get_json(test_app(pool), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
    }
}
