//! Impact score: one weighted 0–100 composite of five sub-scores.

use reachdb_core::posts::TRACKED_KINDS;

/// Reach at which the reach sub-score saturates at 100.
pub const REACH_SATURATION: u64 = 100_000;

const W_ENGAGEMENT: f64 = 0.35;
const W_REACH: f64 = 0.25;
const W_CONSISTENCY: f64 = 0.15;
const W_DIVERSITY: f64 = 0.10;
const W_COMPLETION: f64 = 0.15;

/// Sub-scores feeding the weighted formula, each expected in `[0, 100]`.
///
/// `consistency` and `order_completion` are deliberately distinct inputs even
/// though both currently derive from [`completion_ratio`]; the formula refers
/// to them by name so a changed derivation never touches the weighting.
#[derive(Debug, Clone, Copy)]
pub struct ImpactInputs {
    pub engagement_rate: f64,
    pub reach_score: f64,
    pub consistency: f64,
    pub platform_diversity: f64,
    pub order_completion: f64,
}

/// NaN becomes 0; everything else is clamped to `[0, 100]`.
fn component(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Combine the five sub-scores into a single rounded integer in `[0, 100]`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_impact_score(inputs: &ImpactInputs) -> u8 {
    let weighted = W_ENGAGEMENT * component(inputs.engagement_rate)
        + W_REACH * component(inputs.reach_score)
        + W_CONSISTENCY * component(inputs.consistency)
        + W_DIVERSITY * component(inputs.platform_diversity)
        + W_COMPLETION * component(inputs.order_completion);

    // Components are clamped to [0, 100] and the weights sum to 1.0, so the
    // rounded value always fits in u8.
    weighted.round() as u8
}

/// Linear reach sub-score, saturating at [`REACH_SATURATION`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reach_score(total_reach: u64) -> f64 {
    (total_reach as f64 / REACH_SATURATION as f64 * 100.0).min(100.0)
}

/// Completed-over-total percentage, 0 when there are no orders.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_ratio(completed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

/// Share of the tracked content kinds in use, saturating at 100.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn platform_diversity_score(distinct_kinds: usize) -> f64 {
    (distinct_kinds as f64 / TRACKED_KINDS as f64 * 100.0).min(100.0)
}
