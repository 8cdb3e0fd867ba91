//! The dashboard refresh pipeline: fetch both snapshots, then aggregate.

use reachdb_core::CoreError;
use reachdb_db::{DbError, OrderListRow, PostMetricRow};
use reachdb_metrics::types::{DashboardSummary, OrderFacts, PostMetricFacts};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Fetch the order and metric snapshots for a business and reduce them into
/// a fresh [`DashboardSummary`].
///
/// The two queries run concurrently with no ordering guarantee between their
/// completions; aggregation only runs once both have resolved. Any failure
/// aborts the whole refresh — partial results are never applied.
///
/// # Errors
///
/// Returns [`RefreshError::Db`] if either snapshot query fails, or
/// [`RefreshError::Core`] if a stored status/kind no longer parses (which
/// the schema CHECK constraints make a programming error, not bad data).
pub async fn load_summary(pool: &PgPool, business: Uuid) -> Result<DashboardSummary, RefreshError> {
    let (orders, metrics) = tokio::try_join!(
        reachdb_db::list_orders_for_business(pool, business, None),
        reachdb_db::list_post_metrics_for_business(pool, business),
    )?;

    let orders = order_facts(&orders)?;
    let metrics = metric_facts(&metrics)?;
    Ok(reachdb_metrics::summarize(&orders, &metrics))
}

fn order_facts(rows: &[OrderListRow]) -> Result<Vec<OrderFacts>, CoreError> {
    rows.iter()
        .map(|row| {
            Ok(OrderFacts {
                price: row.price,
                status: row.status.parse()?,
                influencer: row.influencer,
            })
        })
        .collect()
}

fn metric_facts(rows: &[PostMetricRow]) -> Result<Vec<PostMetricFacts>, CoreError> {
    rows.iter()
        .map(|row| {
            Ok(PostMetricFacts {
                post: row.post,
                kind: row.kind.parse()?,
                reach: row.reach.and_then(|r| u64::try_from(r).ok()),
                impressions: row.impressions.and_then(|i| u64::try_from(i).ok()),
                engagement_rate: row.engagement_rate,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn order_facts_carry_price_status_and_influencer() {
        let influencer = Uuid::new_v4();
        let rows = vec![OrderListRow {
            public_id: Uuid::new_v4(),
            service: None,
            price: Some(Decimal::new(1250, 2)),
            status: "approved".to_string(),
            influencer: Some(influencer),
            influencer_handle: None,
            influencer_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        let facts = order_facts(&rows).expect("valid status");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].status, reachdb_core::OrderStatus::Approved);
        assert_eq!(facts[0].influencer, Some(influencer));
    }

    #[test]
    fn unknown_stored_status_fails_the_whole_conversion() {
        let rows = vec![OrderListRow {
            public_id: Uuid::new_v4(),
            service: None,
            price: None,
            status: "archived".to_string(),
            influencer: None,
            influencer_handle: None,
            influencer_name: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        assert!(order_facts(&rows).is_err());
    }

    #[test]
    fn metric_facts_drop_negative_measurements() {
        let rows = vec![PostMetricRow {
            post: Uuid::new_v4(),
            kind: "reel".to_string(),
            reach: Some(-5),
            impressions: Some(10),
            engagement_rate: Some(2.5),
            captured_at: Utc::now(),
        }];

        let facts = metric_facts(&rows).expect("valid kind");
        // The schema forbids negative reach; if one ever appears it is
        // treated as missing rather than poisoning the sums.
        assert_eq!(facts[0].reach, None);
        assert_eq!(facts[0].impressions, Some(10));
    }
}
