//! Score composer: linear blend of the two window ratios.

use crate::{aggregate::WindowRatios, types::TierNumber};
use serde::{Deserialize, Serialize};

/// Policy weights. Validated by `ScoringConfig` to be non-negative and to
/// sum to 1.0, which keeps every composite inside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub recent: f64,
    pub full:   f64,
}

impl ScoreWeights {
    /// Blend the ratios and round to four decimals. The rounded value is the
    /// one compared against thresholds, so a blend that lands on a threshold
    /// up to float error still qualifies.
    pub fn compose(&self, ratios: &WindowRatios) -> f64 {
        round4(self.recent * ratios.recent_ratio + self.full * ratios.full_ratio)
    }
}

pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// The CFA result for one (user, tier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierScore {
    pub tier_number:     TierNumber,
    pub threshold:       f64,
    #[serde(flatten)]
    pub ratios:          WindowRatios,
    pub composite_score: f64,
}

impl TierScore {
    pub fn new(tier_number: TierNumber, threshold: f64, ratios: WindowRatios, weights: ScoreWeights) -> Self {
        Self {
            tier_number,
            threshold,
            ratios,
            composite_score: weights.compose(&ratios),
        }
    }

    /// Inclusive: a score equal to the threshold qualifies.
    pub fn qualifies(&self) -> bool {
        self.composite_score >= self.threshold
    }
}
