//! Supporting statistics carried alongside a tier assignment.
//!
//! All figures are over the full window. Balance statistics use only days
//! with a balance; net statistics use only days where both flows are known.

use crate::{
    capacity::{max_consecutive_payable, DayCapacity},
    window::UserWindow,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total_days:              u32,
    pub avg_balance:             f64,
    pub min_balance:             f64,
    pub max_balance:             f64,
    /// Sample standard deviation; `None` with fewer than two days.
    pub std_balance:             Option<f64>,
    pub avg_daily_income:        Option<f64>,
    pub avg_daily_net:           Option<f64>,
    pub positive_net_days_pct:   Option<f64>,
    /// Longest payable run in the recent window at the decision parcel.
    pub max_consecutive_can_pay: u32,
}

impl Diagnostics {
    /// `None` when the window has no balance-bearing day.
    pub fn compute(window: &UserWindow, recent_capacity: &[DayCapacity]) -> Option<Self> {
        let balances: Vec<f64> = window
            .full()
            .iter()
            .filter_map(|r| r.end_of_day_balance)
            .collect();
        let avg_balance = mean(&balances)?;

        let incomes: Vec<f64> = window.full().iter().filter_map(|r| r.daily_income).collect();
        let nets: Vec<f64> = window.full().iter().filter_map(|r| r.daily_net()).collect();
        let positive_net_days_pct = (!nets.is_empty())
            .then(|| nets.iter().filter(|n| **n > 0.0).count() as f64 / nets.len() as f64);

        Some(Self {
            total_days: balances.len() as u32,
            avg_balance,
            min_balance: balances.iter().copied().fold(f64::INFINITY, f64::min),
            max_balance: balances.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            std_balance: sample_std(&balances, avg_balance),
            avg_daily_income: mean(&incomes),
            avg_daily_net: mean(&nets),
            positive_net_days_pct,
            max_consecutive_can_pay: max_consecutive_payable(recent_capacity),
        })
    }

    /// Average monthly income, approximated as 30 days of average income.
    pub fn avg_monthly_income(&self) -> Option<f64> {
        self.avg_daily_income.map(|d| d * 30.0)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}
