//! Commission and royalty plan types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PlanId, UserId};

/// Which referral track a commission plan belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Reader-referral track (consumer spending).
    Promoter,
    /// Author-referral track (author royalties).
    Author,
}

impl PlanType {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanType::Promoter => "promoter",
            PlanType::Author => "author",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "promoter" => Some(PlanType::Promoter),
            "author" => Some(PlanType::Author),
            _ => None,
        }
    }
}

/// A time-versioned commission plan header.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommissionPlan {
    pub id: PlanId,
    pub plan_type: PlanType,
    pub max_level: u32,
    pub is_custom: bool,
    pub owner_user_id: Option<UserId>,
    /// Unix epoch seconds; half-open effective window `[from, to)`.
    pub effective_from: i64,
    pub effective_to: Option<i64>,
}

impl CommissionPlan {
    /// Whether the plan's effective window covers the given instant.
    pub fn valid_at(&self, instant: i64) -> bool {
        self.effective_from <= instant && self.effective_to.is_none_or(|to| to > instant)
    }
}

/// How a walk level's plan was resolved.
///
/// Keeping the provenance explicit makes the fallback path directly
/// observable in tests instead of being buried in null checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRef {
    /// The edge's assigned plan, still valid at the event instant.
    Assigned(PlanId),
    /// The track's default plan, used because the assignment was missing
    /// or expired at the event instant.
    Default(PlanId),
}

impl PlanRef {
    pub fn plan_id(self) -> PlanId {
        match self {
            PlanRef::Assigned(id) | PlanRef::Default(id) => id,
        }
    }
}

/// A royalty plan: flat fraction of gross revenue owed to the author.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoyaltyPlan {
    pub id: PlanId,
    /// Fraction, e.g. 0.5 for 50%.
    pub royalty_percent: Decimal,
    pub is_default: bool,
    pub start_date: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(from: i64, to: Option<i64>) -> CommissionPlan {
        CommissionPlan {
            id: 1,
            plan_type: PlanType::Promoter,
            max_level: 2,
            is_custom: false,
            owner_user_id: None,
            effective_from: from,
            effective_to: to,
        }
    }

    #[test]
    fn test_open_ended_window() {
        let p = plan(100, None);
        assert!(!p.valid_at(99));
        assert!(p.valid_at(100));
        assert!(p.valid_at(i64::MAX));
    }

    #[test]
    fn test_half_open_window() {
        let p = plan(100, Some(200));
        assert!(p.valid_at(100));
        assert!(p.valid_at(199));
        assert!(!p.valid_at(200));
    }

    #[test]
    fn test_plan_ref_id() {
        assert_eq!(PlanRef::Assigned(7).plan_id(), 7);
        assert_eq!(PlanRef::Default(9).plan_id(), 9);
    }
}
