//! Shared primitive types used across the scoring engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A stable, unique identifier for a scored user.
pub type UserId = String;

/// Tier numbers are small positive integers; higher means a larger offer.
pub type TierNumber = u8;

/// One end-of-day observation for one user.
///
/// Produced by the ingestion layer and never mutated by the engine.
/// `end_of_day_balance` may be absent for days the source could not
/// reconstruct; such days are excluded from "days present" counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub user_id:            UserId,
    pub calendar_date:      NaiveDate,
    pub end_of_day_balance: Option<f64>,
    #[serde(default)]
    pub daily_income:       Option<f64>,
    #[serde(default)]
    pub daily_expenses:     Option<f64>,
}

impl DailyRecord {
    pub fn new(user_id: impl Into<UserId>, calendar_date: NaiveDate, balance: f64) -> Self {
        Self {
            user_id: user_id.into(),
            calendar_date,
            end_of_day_balance: Some(balance),
            daily_income: None,
            daily_expenses: None,
        }
    }

    pub fn with_flows(mut self, income: f64, expenses: f64) -> Self {
        self.daily_income = Some(income);
        self.daily_expenses = Some(expenses);
        self
    }

    /// A day counts as active when money moved. Sources that never report
    /// flows fall back to record presence.
    pub fn is_active(&self) -> bool {
        match (self.daily_income, self.daily_expenses) {
            (None, None) => true,
            (income, expenses) => {
                income.is_some_and(|v| v != 0.0) || expenses.is_some_and(|v| v != 0.0)
            }
        }
    }

    /// Income minus expenses, only when both flows are known.
    pub fn daily_net(&self) -> Option<f64> {
        Some(self.daily_income? - self.daily_expenses?)
    }
}
