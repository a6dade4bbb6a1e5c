//! Reporter: packages engine output into the per-user and portfolio
//! contracts. Rounding and bucketing only; nothing is rescored here.

use crate::{
    config::{ScoringConfig, TierDefinition},
    diagnostics::Diagnostics,
    engine::{BatchOutcome, TierAssignment},
    tier::AssignedTier,
    types::{TierNumber, UserId},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

pub use crate::score::round4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Conditional,
    Deny,
}

impl Recommendation {
    /// The entry tier is a conditional approval; anything above it is a
    /// plain approval.
    pub fn for_tier(tier: AssignedTier, config: &ScoringConfig) -> Self {
        match (tier, config.entry_tier()) {
            (AssignedTier::Denied, _) => Recommendation::Deny,
            (AssignedTier::Tier(n), Some(entry)) if n == entry.tier_number => {
                Recommendation::Conditional
            }
            (AssignedTier::Tier(_), _) => Recommendation::Approve,
        }
    }

    pub fn describe(&self, tier: Option<&TierDefinition>) -> String {
        match (self, tier) {
            (Recommendation::Deny, _) | (_, None) => {
                "DENY - balance does not cover parcels consistently".to_string()
            }
            (Recommendation::Conditional, Some(t)) => format!(
                "CONDITIONAL - marginal capacity, only tier {} (${:.0}, {} days)",
                t.tier_number, t.loan_amount, t.term_days
            ),
            (Recommendation::Approve, Some(t)) => format!(
                "APPROVE - eligible for tier {} (${:.0}, {} days)",
                t.tier_number, t.loan_amount, t.term_days
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBreakdown {
    pub tier_number:     TierNumber,
    pub recent_ratio:    f64,
    pub full_ratio:      f64,
    pub composite_score: f64,
    pub qualified:       bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReport {
    pub user_id:                 UserId,
    pub assigned_tier:           AssignedTier,
    pub score:                   Option<f64>,
    pub avg_balance:             f64,
    pub avg_monthly_income:      Option<f64>,
    pub min_balance:             f64,
    pub max_balance:             f64,
    pub std_balance:             Option<f64>,
    pub avg_daily_net:           Option<f64>,
    pub positive_net_days_pct:   Option<f64>,
    pub max_consecutive_can_pay: u32,
    pub total_days:              u32,
    pub recommendation:          Recommendation,
    pub recommendation_text:     String,
    pub tiers:                   Vec<TierBreakdown>,
}

impl UserReport {
    pub fn from_assignment(a: &TierAssignment, config: &ScoringConfig) -> Self {
        let d: &Diagnostics = &a.diagnostics;
        let recommendation = Recommendation::for_tier(a.tier, config);
        let tier_def = a.tier.tier_number().and_then(|n| config.tier(n));

        Self {
            user_id:                 a.user_id.clone(),
            assigned_tier:           a.tier,
            score:                   a.score.map(round4),
            avg_balance:             round2(d.avg_balance),
            avg_monthly_income:      d.avg_monthly_income().map(round2),
            min_balance:             round2(d.min_balance),
            max_balance:             round2(d.max_balance),
            std_balance:             d.std_balance.map(round2),
            avg_daily_net:           d.avg_daily_net.map(round2),
            positive_net_days_pct:   d.positive_net_days_pct.map(round4),
            max_consecutive_can_pay: d.max_consecutive_can_pay,
            total_days:              d.total_days,
            recommendation,
            recommendation_text:     recommendation.describe(tier_def),
            tiers: a
                .tier_scores
                .iter()
                .map(|s| TierBreakdown {
                    tier_number:     s.tier_number,
                    recent_ratio:    round4(s.ratios.recent_ratio),
                    full_ratio:      round4(s.ratios.full_ratio),
                    composite_score: round4(s.composite_score),
                    qualified:       s.qualifies(),
                })
                .collect(),
        }
    }
}

/// Aggregate figures for one bucket (a tier, or the denied bucket).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier:               AssignedTier,
    pub label:              String,
    pub count:              usize,
    pub pct_of_population:  f64,
    pub avg_score:          Option<f64>,
    pub avg_monthly_income: Option<f64>,
    pub avg_balance:        Option<f64>,
    pub loan_capacity:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub as_of:            NaiveDate,
    /// Users that received a tier or a denial; the percentage base.
    pub scored_users:     usize,
    pub ineligible_users: usize,
    pub failed_users:     usize,
    /// Highest tier first, denied last.
    pub tiers:            Vec<TierSummary>,
    pub total_loan_capacity: f64,
}

impl PortfolioSummary {
    pub fn from_batch(batch: &BatchOutcome, config: &ScoringConfig) -> Self {
        let scored = batch.assignments.len();

        let mut tiers: Vec<TierSummary> = config
            .tiers
            .iter()
            .rev()
            .map(|t| summarize(batch, AssignedTier::Tier(t.tier_number), &t.label, t.loan_amount, scored))
            .collect();
        tiers.push(summarize(batch, AssignedTier::Denied, "Denied", 0.0, scored));

        let total_loan_capacity = tiers.iter().map(|t| t.loan_capacity).sum();

        Self {
            as_of: config.as_of_date,
            scored_users: scored,
            ineligible_users: batch.ineligible.len(),
            failed_users: batch.failures.len(),
            tiers,
            total_loan_capacity,
        }
    }

    pub fn bucket(&self, tier: AssignedTier) -> Option<&TierSummary> {
        self.tiers.iter().find(|t| t.tier == tier)
    }
}

fn summarize(
    batch: &BatchOutcome,
    tier: AssignedTier,
    label: &str,
    loan_amount: f64,
    population: usize,
) -> TierSummary {
    let members: Vec<&TierAssignment> =
        batch.assignments.iter().filter(|a| a.tier == tier).collect();
    let count = members.len();
    let pct_of_population = if population == 0 {
        0.0
    } else {
        round4(count as f64 / population as f64 * 100.0)
    };

    TierSummary {
        tier,
        label: label.to_string(),
        count,
        pct_of_population,
        avg_score: mean_of(members.iter().filter_map(|a| a.score)).map(round4),
        avg_monthly_income: mean_of(
            members.iter().filter_map(|a| a.diagnostics.avg_monthly_income()),
        )
        .map(round2),
        avg_balance: mean_of(members.iter().map(|a| a.diagnostics.avg_balance)).map(round2),
        loan_capacity: round2(count as f64 * loan_amount),
    }
}

/// Full JSON document: per-user reports plus the portfolio summary.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringReport {
    pub users:      Vec<UserReport>,
    pub ineligible: Vec<crate::engine::IneligibleUser>,
    pub failures:   Vec<crate::engine::UserFailure>,
    pub summary:    PortfolioSummary,
}

impl ScoringReport {
    pub fn build(batch: &BatchOutcome, config: &ScoringConfig) -> Self {
        Self {
            users: batch
                .assignments
                .iter()
                .map(|a| UserReport::from_assignment(a, config))
                .collect(),
            ineligible: batch.ineligible.clone(),
            failures: batch.failures.clone(),
            summary: PortfolioSummary::from_batch(batch, config),
        }
    }

    /// Plain-text rendering for terminals.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== CFA SCORES (as of {}) ===", self.summary.as_of);
        let _ = writeln!(
            out,
            "  {:<16} {:>8} {:>7} {:>11} {:>12} {:>6}  {}",
            "user", "tier", "score", "avg_bal", "avg_mo_inc", "streak", "recommendation"
        );
        for u in &self.users {
            let _ = writeln!(
                out,
                "  {:<16} {:>8} {:>7} {:>11.2} {:>12} {:>6}  {}",
                u.user_id,
                u.assigned_tier.to_string(),
                u.score.map(|s| format!("{:.2}%", s * 100.0)).unwrap_or_else(|| "-".into()),
                u.avg_balance,
                u.avg_monthly_income.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into()),
                u.max_consecutive_can_pay,
                u.recommendation_text,
            );
        }

        let s = &self.summary;
        let _ = writeln!(out);
        let _ = writeln!(out, "=== PORTFOLIO SUMMARY ===");
        let _ = writeln!(out, "  scored:      {}", s.scored_users);
        let _ = writeln!(out, "  ineligible:  {}", s.ineligible_users);
        let _ = writeln!(out, "  failed:      {}", s.failed_users);
        for t in &s.tiers {
            let _ = writeln!(
                out,
                "  {:<8} {:<10} | n={:<6} | {:>6.2}% | avg score {} | capacity ${:.0}",
                t.tier.to_string(),
                t.label,
                t.count,
                t.pct_of_population,
                t.avg_score.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into()),
                t.loan_capacity,
            );
        }
        let _ = writeln!(out, "  total loan capacity: ${:.0}", s.total_loan_capacity);
        out
    }
}

fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
