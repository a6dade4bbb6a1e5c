//! Scoring configuration: tier catalogue, window sizes, and policy weights.
//!
//! Loaded from `data/config/*.json` by the runner. Tests use
//! `ScoringConfig::reference(as_of)`. Every constructor runs `validate()`,
//! so an engine never sees an inconsistent tier table.

use crate::{
    error::{CfaError, CfaResult},
    score::ScoreWeights,
    types::TierNumber,
};
use anyhow::Context;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_RECENT_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_FULL_WINDOW_MONTHS: u32 = 6;
pub const DEFAULT_WEIGHT_RECENT: f64 = 0.70;
pub const DEFAULT_WEIGHT_FULL: f64 = 0.30;
pub const DEFAULT_MIN_ACTIVE_DAYS: u32 = 7;
pub const DEFAULT_ACTIVITY_RECENCY_DAYS: u32 = 90;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub tier_number:     TierNumber,
    pub label:           String,
    pub loan_amount:     f64,
    pub term_days:       u32,
    pub biweekly_parcel: f64,
    pub score_threshold: f64,
    #[serde(default)]
    pub description:     String,
}

#[derive(Debug, Clone, Deserialize)]
struct ScoringConfigFile {
    #[serde(default)]
    as_of_date: Option<NaiveDate>,
    tiers: Vec<TierDefinition>,
    #[serde(default = "default_recent_window_days")]
    recent_window_days: u32,
    #[serde(default = "default_full_window_months")]
    full_window_months: u32,
    #[serde(default = "default_weight_recent")]
    weight_recent: f64,
    #[serde(default = "default_weight_full")]
    weight_full: f64,
    #[serde(default = "default_min_active_days")]
    min_active_days: u32,
    #[serde(default = "default_activity_recency_days")]
    activity_recency_days: u32,
}

fn default_recent_window_days() -> u32 { DEFAULT_RECENT_WINDOW_DAYS }
fn default_full_window_months() -> u32 { DEFAULT_FULL_WINDOW_MONTHS }
fn default_weight_recent() -> f64 { DEFAULT_WEIGHT_RECENT }
fn default_weight_full() -> f64 { DEFAULT_WEIGHT_FULL }
fn default_min_active_days() -> u32 { DEFAULT_MIN_ACTIVE_DAYS }
fn default_activity_recency_days() -> u32 { DEFAULT_ACTIVITY_RECENCY_DAYS }

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    /// Reference "today". Never read from the system clock.
    pub as_of_date:            NaiveDate,
    /// Ascending by `tier_number`; enforced by `validate()`.
    pub tiers:                 Vec<TierDefinition>,
    pub recent_window_days:    u32,
    pub full_window_months:    u32,
    pub weight_recent:         f64,
    pub weight_full:           f64,
    pub min_active_days:       u32,
    pub activity_recency_days: u32,
}

impl ScoringConfig {
    /// Load a tier table from a JSON file.
    ///
    /// `as_of_override` wins over any `as_of_date` in the file; one of the
    /// two must be present.
    pub fn load(path: impl AsRef<Path>, as_of_override: Option<NaiveDate>) -> CfaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        Self::from_json(&content, as_of_override)
    }

    pub fn from_json(content: &str, as_of_override: Option<NaiveDate>) -> CfaResult<Self> {
        let file: ScoringConfigFile = serde_json::from_str(content)?;
        let as_of_date = as_of_override.or(file.as_of_date).ok_or_else(|| {
            CfaError::InvalidConfig("as_of_date must be set in the file or passed explicitly".into())
        })?;

        let config = Self {
            as_of_date,
            tiers: file.tiers,
            recent_window_days: file.recent_window_days,
            full_window_months: file.full_window_months,
            weight_recent: file.weight_recent,
            weight_full: file.weight_full,
            min_active_days: file.min_active_days,
            activity_recency_days: file.activity_recency_days,
        };
        config.validate()?;
        Ok(config)
    }

    /// The tier table the production query runs with.
    ///
    /// Thresholds are 0.70 / 0.60 / 0.50. The underwriting narrative quotes
    /// 0.85 / 0.70 / 0.55; that set ships as `cfa_tiers_documented.json`.
    pub fn reference(as_of_date: NaiveDate) -> Self {
        Self {
            as_of_date,
            tiers: vec![
                TierDefinition {
                    tier_number:     1,
                    label:           "Starter".into(),
                    loan_amount:     100.0,
                    term_days:       30,
                    biweekly_parcel: 51.98,
                    score_threshold: 0.50,
                    description:     "Marginal repayment capacity".into(),
                },
                TierDefinition {
                    tier_number:     2,
                    label:           "Standard".into(),
                    loan_amount:     150.0,
                    term_days:       60,
                    biweekly_parcel: 39.72,
                    score_threshold: 0.60,
                    description:     "Good repayment capacity".into(),
                },
                TierDefinition {
                    tier_number:     3,
                    label:           "Premium".into(),
                    loan_amount:     200.0,
                    term_days:       90,
                    biweekly_parcel: 35.80,
                    score_threshold: 0.70,
                    description:     "Consistently high repayment capacity".into(),
                },
            ],
            recent_window_days:    DEFAULT_RECENT_WINDOW_DAYS,
            full_window_months:    DEFAULT_FULL_WINDOW_MONTHS,
            weight_recent:         DEFAULT_WEIGHT_RECENT,
            weight_full:           DEFAULT_WEIGHT_FULL,
            min_active_days:       DEFAULT_MIN_ACTIVE_DAYS,
            activity_recency_days: DEFAULT_ACTIVITY_RECENCY_DAYS,
        }
    }

    /// Reject inconsistent configuration before any user is scored.
    pub fn validate(&self) -> CfaResult<()> {
        let invalid = |msg: String| Err(CfaError::InvalidConfig(msg));

        if self.tiers.is_empty() {
            return invalid("tier list is empty".into());
        }

        for tier in &self.tiers {
            if tier.tier_number == 0 {
                return invalid(format!("tier '{}' has tier_number 0", tier.label));
            }
            if !(0.0..=1.0).contains(&tier.score_threshold) {
                return invalid(format!(
                    "tier {} threshold {} is outside [0, 1]",
                    tier.tier_number, tier.score_threshold
                ));
            }
            if !tier.biweekly_parcel.is_finite() || tier.biweekly_parcel <= 0.0 {
                return invalid(format!(
                    "tier {} parcel {} must be a positive amount",
                    tier.tier_number, tier.biweekly_parcel
                ));
            }
            if !tier.loan_amount.is_finite() || tier.loan_amount < 0.0 {
                return invalid(format!(
                    "tier {} loan amount {} must be non-negative",
                    tier.tier_number, tier.loan_amount
                ));
            }
        }

        for pair in self.tiers.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if hi.tier_number <= lo.tier_number {
                return invalid(format!(
                    "tiers must be strictly ascending by tier_number: {} then {}",
                    lo.tier_number, hi.tier_number
                ));
            }
            if hi.score_threshold <= lo.score_threshold {
                return invalid(format!(
                    "tier {} threshold {} must exceed tier {} threshold {}",
                    hi.tier_number, hi.score_threshold, lo.tier_number, lo.score_threshold
                ));
            }
        }

        let weights_ok = [self.weight_recent, self.weight_full]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0);
        if !weights_ok {
            return invalid(format!(
                "weights must be non-negative: recent={} full={}",
                self.weight_recent, self.weight_full
            ));
        }
        if ((self.weight_recent + self.weight_full) - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return invalid(format!(
                "weights must sum to 1.0: recent={} full={}",
                self.weight_recent, self.weight_full
            ));
        }

        if self.recent_window_days == 0 || self.full_window_months == 0 {
            return invalid("window sizes must be positive".into());
        }
        if self.activity_recency_days == 0 {
            return invalid("activity_recency_days must be positive".into());
        }
        if self.recent_window_start() < self.full_window_start() {
            return invalid(format!(
                "recent window of {} days is longer than the {}-month full window",
                self.recent_window_days, self.full_window_months
            ));
        }

        Ok(())
    }

    pub fn weights(&self) -> ScoreWeights {
        ScoreWeights {
            recent: self.weight_recent,
            full:   self.weight_full,
        }
    }

    /// Exclusive lower bound of the full window: `(start, as_of]`.
    pub fn full_window_start(&self) -> NaiveDate {
        self.as_of_date
            .checked_sub_months(Months::new(self.full_window_months))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Exclusive lower bound of the recent window: `(start, as_of]`.
    pub fn recent_window_start(&self) -> NaiveDate {
        self.as_of_date
            .checked_sub_days(Days::new(u64::from(self.recent_window_days)))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn tier(&self, tier_number: TierNumber) -> Option<&TierDefinition> {
        self.tiers.iter().find(|t| t.tier_number == tier_number)
    }

    /// The lowest tier; the last one the selector checks.
    pub fn entry_tier(&self) -> Option<&TierDefinition> {
        self.tiers.first()
    }
}
