//! The scoring engine: one pure pass per user, fanned out across users.
//!
//! PIPELINE ORDER (fixed, strictly forward):
//!   1. Window builder      (window.rs)    full/recent windows + activity gate
//!   2. Capacity evaluator  (capacity.rs)  can-pay flag per day per tier
//!   3. Window aggregator   (aggregate.rs) recent_ratio, full_ratio
//!   4. Score composer      (score.rs)     weighted composite
//!   5. Tier selector       (tier.rs)      highest qualifying tier or denial
//!   6. Reporter            (report.rs)    output contract, outside the engine
//!
//! RULES:
//!   - `as_of` comes from the config. Nothing here reads the clock.
//!   - Users share no state; a batch is a parallel map over users.
//!   - One user's defect never aborts the batch. It is collected as a
//!     `UserFailure` and the batch continues.
//!   - Output is sorted by user id, so two runs on the same input are
//!     identical regardless of thread scheduling.

use crate::{
    aggregate::aggregate,
    capacity::CanPaySeries,
    config::ScoringConfig,
    diagnostics::Diagnostics,
    error::{CfaError, CfaResult},
    score::TierScore,
    tier::{select_tier, AssignedTier},
    types::{DailyRecord, TierNumber, UserId},
    window::{build_window, Ineligibility, WindowOutcome},
};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// The single decision for one user in one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAssignment {
    pub user_id:     UserId,
    pub as_of:       NaiveDate,
    pub tier:        AssignedTier,
    pub score:       Option<f64>,
    /// Every tier's score, ascending by tier number.
    pub tier_scores: Vec<TierScore>,
    pub diagnostics: Diagnostics,
}

impl TierAssignment {
    pub fn tier_score(&self, tier_number: TierNumber) -> Option<&TierScore> {
        self.tier_scores.iter().find(|s| s.tier_number == tier_number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserOutcome {
    Scored(TierAssignment),
    Ineligible(Ineligibility),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IneligibleUser {
    pub user_id: UserId,
    #[serde(flatten)]
    pub reason:  Ineligibility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserFailure {
    pub user_id: UserId,
    pub error:   String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub assignments: Vec<TierAssignment>,
    pub ineligible:  Vec<IneligibleUser>,
    pub failures:    Vec<UserFailure>,
}

impl BatchOutcome {
    /// Append a later page of results. Pages must arrive in ascending
    /// user order, as `RecordStore::for_each_user_page` yields them; each
    /// list then stays sorted without re-sorting.
    pub fn merge(&mut self, other: BatchOutcome) {
        debug_assert!(self.last_user() <= other.first_user() || other.user_count() == 0);
        self.assignments.extend(other.assignments);
        self.ineligible.extend(other.ineligible);
        self.failures.extend(other.failures);
    }

    fn first_user(&self) -> Option<&str> {
        [
            self.assignments.first().map(|a| a.user_id.as_str()),
            self.ineligible.first().map(|i| i.user_id.as_str()),
            self.failures.first().map(|f| f.user_id.as_str()),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn last_user(&self) -> Option<&str> {
        [
            self.assignments.last().map(|a| a.user_id.as_str()),
            self.ineligible.last().map(|i| i.user_id.as_str()),
            self.failures.last().map(|f| f.user_id.as_str()),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    pub fn user_count(&self) -> usize {
        self.assignments.len() + self.ineligible.len() + self.failures.len()
    }
}

pub struct CfaEngine {
    config: ScoringConfig,
}

impl CfaEngine {
    /// Build an engine. Rejects an inconsistent configuration up front.
    pub fn new(config: ScoringConfig) -> CfaResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Run the full pipeline for one user.
    pub fn score_user(&self, user_id: &str, records: Vec<DailyRecord>) -> CfaResult<UserOutcome> {
        let window = match build_window(user_id, records, &self.config)? {
            WindowOutcome::Eligible(w) => w,
            WindowOutcome::Ineligible(reason) => {
                log::debug!("user={user_id} ineligible: {reason:?}");
                return Ok(UserOutcome::Ineligible(reason));
            }
        };

        let weights = self.config.weights();
        let mut series_by_tier = Vec::with_capacity(self.config.tiers.len());
        let mut tier_scores = Vec::with_capacity(self.config.tiers.len());

        for tier in &self.config.tiers {
            let series = CanPaySeries::evaluate(window.full(), tier);
            let ratios = aggregate(
                user_id,
                &series,
                window.recent_start,
                self.config.recent_window_days,
            )?;
            tier_scores.push(TierScore::new(tier.tier_number, tier.score_threshold, ratios, weights));
            series_by_tier.push(series);
        }

        let decision = select_tier(&tier_scores);

        // Streak diagnostic uses the assigned tier's parcel, or the entry
        // tier's for a denial. Tiers are ascending, so the entry tier is first.
        let decision_series = decision
            .tier
            .tier_number()
            .and_then(|n| series_by_tier.iter().find(|s| s.tier_number == n))
            .or_else(|| series_by_tier.first());
        let recent_capacity = decision_series
            .map(|s| s.since(window.recent_start))
            .unwrap_or(&[]);

        let diagnostics = Diagnostics::compute(&window, recent_capacity).ok_or_else(|| {
            CfaError::EmptyWindow {
                user_id: user_id.to_string(),
            }
        })?;

        log::debug!(
            "user={user_id} tier={} score={:?} days={}",
            decision.tier,
            decision.score,
            diagnostics.total_days
        );

        Ok(UserOutcome::Scored(TierAssignment {
            user_id: user_id.to_string(),
            as_of: self.config.as_of_date,
            tier: decision.tier,
            score: decision.score,
            tier_scores,
            diagnostics,
        }))
    }

    /// Score a flat set of records, grouping them by user first.
    pub fn score_records(&self, records: Vec<DailyRecord>) -> BatchOutcome {
        self.score_users(group_by_user(records))
    }

    /// Score many users in parallel.
    pub fn score_users(&self, users: BTreeMap<UserId, Vec<DailyRecord>>) -> BatchOutcome {
        let results: Vec<(UserId, CfaResult<UserOutcome>)> = users
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(user_id, records)| {
                let outcome = self.score_user(&user_id, records);
                (user_id, outcome)
            })
            .collect();

        let mut batch = BatchOutcome::default();
        for (user_id, result) in results {
            match result {
                Ok(UserOutcome::Scored(assignment)) => batch.assignments.push(assignment),
                Ok(UserOutcome::Ineligible(reason)) => {
                    batch.ineligible.push(IneligibleUser { user_id, reason })
                }
                Err(e) => {
                    log::warn!("user={user_id} skipped: {e}");
                    batch.failures.push(UserFailure {
                        user_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "as_of={} scored={} ineligible={} failed={}",
            self.config.as_of_date,
            batch.assignments.len(),
            batch.ineligible.len(),
            batch.failures.len()
        );
        batch
    }
}

/// Partition records by user. `BTreeMap` fixes the iteration order.
pub fn group_by_user(records: Vec<DailyRecord>) -> BTreeMap<UserId, Vec<DailyRecord>> {
    let mut users: BTreeMap<UserId, Vec<DailyRecord>> = BTreeMap::new();
    for record in records {
        users.entry(record.user_id.clone()).or_default().push(record);
    }
    users
}
