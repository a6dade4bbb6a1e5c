//! Tier selector: highest tier whose own score clears its own threshold.
//!
//! Tiers are checked top-down and the walk stops at the first hit. A lower
//! tier may carry a higher composite (its parcel can be smaller or larger),
//! so the decision never compares scores across tiers.

use crate::{score::TierScore, types::TierNumber};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssignedTier {
    Denied,
    Tier(TierNumber),
}

impl AssignedTier {
    pub fn tier_number(&self) -> Option<TierNumber> {
        match self {
            AssignedTier::Tier(n) => Some(*n),
            AssignedTier::Denied => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AssignedTier::Denied)
    }
}

/// Serializes as the bare tier number or the string `"denied"`.
impl Serialize for AssignedTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AssignedTier::Tier(n) => serializer.serialize_u8(*n),
            AssignedTier::Denied => serializer.serialize_str("denied"),
        }
    }
}

impl fmt::Display for AssignedTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignedTier::Tier(n) => write!(f, "Tier {n}"),
            AssignedTier::Denied => write!(f, "Denied"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierDecision {
    pub tier:  AssignedTier,
    /// The assigned tier's own composite. For a denial, the entry tier's
    /// composite; `None` only when there were no scores at all.
    pub score: Option<f64>,
}

/// Pick the tier for one user from the per-tier scores.
///
/// `scores` may be in any order.
pub fn select_tier(scores: &[TierScore]) -> TierDecision {
    let mut ordered: Vec<&TierScore> = scores.iter().collect();
    ordered.sort_by(|a, b| b.tier_number.cmp(&a.tier_number));

    if let Some(hit) = ordered.iter().find(|s| s.qualifies()) {
        return TierDecision {
            tier:  AssignedTier::Tier(hit.tier_number),
            score: Some(hit.composite_score),
        };
    }

    TierDecision {
        tier:  AssignedTier::Denied,
        score: ordered.last().map(|s| s.composite_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::WindowRatios;

    fn score(tier_number: TierNumber, threshold: f64, composite: f64) -> TierScore {
        TierScore {
            tier_number,
            threshold,
            ratios: WindowRatios {
                recent_payable_days: 0,
                full_payable_days:   0,
                full_present_days:   1,
                recent_ratio:        composite,
                full_ratio:          composite,
            },
            composite_score: composite,
        }
    }

    #[test]
    fn highest_qualifying_tier_wins() {
        let scores = [score(1, 0.5, 0.9), score(2, 0.6, 0.65), score(3, 0.7, 0.69)];
        let d = select_tier(&scores);
        assert_eq!(d.tier, AssignedTier::Tier(2));
        assert_eq!(d.score, Some(0.65));
    }

    #[test]
    fn carried_score_is_the_assigned_tiers_not_the_max() {
        let scores = [score(1, 0.5, 0.95), score(2, 0.6, 0.61), score(3, 0.7, 0.2)];
        let d = select_tier(&scores);
        assert_eq!(d.tier, AssignedTier::Tier(2));
        assert_eq!(d.score, Some(0.61));
    }

    #[test]
    fn exact_threshold_qualifies() {
        let scores = [score(1, 0.5, 0.1), score(2, 0.6, 0.1), score(3, 0.7, 0.7)];
        assert_eq!(select_tier(&scores).tier, AssignedTier::Tier(3));
    }

    #[test]
    fn denial_carries_entry_tier_score() {
        let scores = [score(3, 0.7, 0.4), score(1, 0.5, 0.3), score(2, 0.6, 0.45)];
        let d = select_tier(&scores);
        assert_eq!(d.tier, AssignedTier::Denied);
        assert_eq!(d.score, Some(0.3));
    }

    #[test]
    fn no_scores_is_denied_without_score() {
        let d = select_tier(&[]);
        assert_eq!(d.tier, AssignedTier::Denied);
        assert_eq!(d.score, None);
    }

    #[test]
    fn serializes_as_number_or_denied() {
        assert_eq!(serde_json::to_string(&AssignedTier::Tier(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&AssignedTier::Denied).unwrap(), "\"denied\"");
    }
}
