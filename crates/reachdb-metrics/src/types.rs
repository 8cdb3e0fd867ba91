//! Input facts and the derived dashboard summary.

use reachdb_core::{OrderStatus, PostKind};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// The slice of an order that aggregation cares about.
#[derive(Debug, Clone)]
pub struct OrderFacts {
    /// Agreed price; `None` aggregates as zero.
    pub price: Option<Decimal>,
    pub status: OrderStatus,
    /// Influencer the order was placed with; `None` is ignored for cardinality.
    pub influencer: Option<Uuid>,
}

/// One measured performance record for a published post.
#[derive(Debug, Clone)]
pub struct PostMetricFacts {
    pub post: Uuid,
    pub kind: PostKind,
    pub reach: Option<u64>,
    pub impressions: Option<u64>,
    /// Non-negative percentage; `None` aggregates as zero.
    pub engagement_rate: Option<f64>,
}

/// Post counts backing the current metric set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PostStats {
    /// Distinct posts with at least one metric record.
    pub total: u64,
    pub reels: u64,
    pub videos: u64,
    pub shorts: u64,
}

/// Derived dashboard state. Never persisted; a pure function of the current
/// order and metric sets, recomputed in full on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_spent: Decimal,
    pub total_orders: u64,
    pub completed_campaigns: u64,
    pub active_requests: u64,
    pub connected_influencers: u64,
    pub total_reach: u64,
    pub avg_engagement_rate: f64,
    pub post_stats: PostStats,
    pub impact_score: u8,
}
