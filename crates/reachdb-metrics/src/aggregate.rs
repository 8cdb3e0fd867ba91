//! Reduction of order and post-metric snapshots into a [`DashboardSummary`].

use std::collections::HashSet;

use reachdb_core::{OrderStatus, PostKind};
use rust_decimal::Decimal;

use crate::impact::{
    calculate_impact_score, completion_ratio, platform_diversity_score, reach_score, ImpactInputs,
};
use crate::types::{DashboardSummary, OrderFacts, PostMetricFacts, PostStats};

/// Reduce point-in-time order and metric snapshots into a dashboard summary.
///
/// Deterministic and side-effect free: identical inputs yield identical
/// output, and the input slices are never mutated. Missing prices, reach
/// values, and engagement rates all aggregate as zero.
#[must_use]
pub fn summarize(orders: &[OrderFacts], metrics: &[PostMetricFacts]) -> DashboardSummary {
    let mut total_spent = Decimal::ZERO;
    let mut total_orders = 0_u64;
    let mut completed_campaigns = 0_u64;
    let mut active_requests = 0_u64;
    let mut influencers: HashSet<_> = HashSet::new();

    for order in orders {
        total_orders += 1;
        total_spent += order.price.unwrap_or(Decimal::ZERO);
        if order.status == OrderStatus::Completed {
            completed_campaigns += 1;
        }
        if order.status.is_active() {
            active_requests += 1;
        }
        if let Some(influencer) = order.influencer {
            influencers.insert(influencer);
        }
    }

    let mut total_reach = 0_u64;
    let mut engagement_sum = 0.0_f64;
    let mut metric_count = 0_u32;
    let mut posts: HashSet<_> = HashSet::new();
    let mut kinds: HashSet<PostKind> = HashSet::new();
    let mut post_stats = PostStats::default();

    for metric in metrics {
        metric_count += 1;
        total_reach += metric.reach.unwrap_or(0);
        engagement_sum += metric.engagement_rate.unwrap_or(0.0);
        kinds.insert(metric.kind);

        // Count each post once, under its kind, however many metric rows it has.
        if posts.insert(metric.post) {
            post_stats.total += 1;
            match metric.kind {
                PostKind::Reel => post_stats.reels += 1,
                PostKind::Video => post_stats.videos += 1,
                PostKind::Short => post_stats.shorts += 1,
                PostKind::Image => {}
            }
        }
    }

    let avg_engagement_rate = if metric_count == 0 {
        0.0
    } else {
        engagement_sum / f64::from(metric_count)
    };

    let completion = completion_ratio(completed_campaigns, total_orders);
    let impact_score = calculate_impact_score(&ImpactInputs {
        engagement_rate: avg_engagement_rate,
        reach_score: reach_score(total_reach),
        consistency: completion,
        platform_diversity: platform_diversity_score(kinds.len()),
        order_completion: completion,
    });

    DashboardSummary {
        // Normalized so fixed-scale store values ("283000.00") and plain
        // amounts ("283000") summarize identically.
        total_spent: total_spent.normalize(),
        total_orders,
        completed_campaigns,
        active_requests,
        connected_influencers: influencers.len() as u64,
        total_reach,
        avg_engagement_rate,
        post_stats,
        impact_score,
    }
}
