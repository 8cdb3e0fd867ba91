//! Order status lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Status of a business-to-influencer service order.
///
/// Orders are never deleted; they only move through this lifecycle:
/// pending → approved → completed → paid, with rejection possible while
/// the order is still active. `paid` and `rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Completed,
    Paid,
    Rejected,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Completed => "completed",
            OrderStatus::Paid => "paid",
            OrderStatus::Rejected => "rejected",
        }
    }

    /// An active order is one still awaiting fulfilment.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Approved)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Rejected)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    #[must_use]
    pub const fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Approved, OrderStatus::Completed)
                | (OrderStatus::Approved, OrderStatus::Rejected)
                | (OrderStatus::Completed, OrderStatus::Paid)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "completed" => Ok(OrderStatus::Completed),
            "paid" => Ok(OrderStatus::Paid),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(CoreError::UnknownOrderStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Completed,
            OrderStatus::Paid,
            OrderStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_an_error() {
        let result = "shipped".parse::<OrderStatus>();
        assert!(
            matches!(result, Err(CoreError::UnknownOrderStatus(ref s)) if s == "shipped"),
            "expected UnknownOrderStatus, got: {result:?}"
        );
    }

    #[test]
    fn active_means_pending_or_approved() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::Approved.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Paid.is_active());
        assert!(!OrderStatus::Rejected.is_active());
    }

    #[test]
    fn paid_follows_completed_only() {
        assert!(OrderStatus::Completed.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Paid));
        assert!(!OrderStatus::Approved.can_transition_to(OrderStatus::Paid));
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Approved,
            OrderStatus::Completed,
            OrderStatus::Paid,
            OrderStatus::Rejected,
        ] {
            assert!(!OrderStatus::Paid.can_transition_to(next));
            assert!(!OrderStatus::Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let back: OrderStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(back, OrderStatus::Paid);
    }
}
