//! Pure dashboard computations: metric aggregation and the impact score.
//!
//! Nothing in this crate performs I/O; callers fetch rows, convert them to
//! the fact types in [`types`], and get a [`types::DashboardSummary`] back.

mod aggregate;
mod impact;
pub mod types;

pub use aggregate::summarize;
pub use impact::{
    calculate_impact_score, completion_ratio, platform_diversity_score, reach_score, ImpactInputs,
    REACH_SATURATION,
};
