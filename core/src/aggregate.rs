//! Window aggregator: reduces a can-pay series into the two window ratios.
//!
//! The two denominators differ on purpose:
//!   recent_ratio = payable(recent) / recent_window_days   (fixed, gaps penalized)
//!   full_ratio   = payable(full)   / present_days(full)   (gaps excluded)

use crate::{
    capacity::{payable_in, CanPaySeries},
    error::{CfaError, CfaResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRatios {
    pub recent_payable_days: u32,
    pub full_payable_days:   u32,
    pub full_present_days:   u32,
    pub recent_ratio:        f64,
    pub full_ratio:          f64,
}

/// Aggregate a full-window series. `recent_start` is the exclusive lower
/// bound of the recent window.
///
/// Fails with `EmptyWindow` when no day in the full window has a balance;
/// the full ratio would be 0/0.
pub fn aggregate(
    user_id: &str,
    series: &CanPaySeries,
    recent_start: NaiveDate,
    recent_window_days: u32,
) -> CfaResult<WindowRatios> {
    let full_present_days = series.present_days();
    if full_present_days == 0 {
        return Err(CfaError::EmptyWindow {
            user_id: user_id.to_string(),
        });
    }

    let full_payable_days = series.payable_days();
    let recent_payable_days = payable_in(series.since(recent_start));

    Ok(WindowRatios {
        recent_payable_days,
        full_payable_days,
        full_present_days,
        recent_ratio: f64::from(recent_payable_days) / f64::from(recent_window_days),
        full_ratio: f64::from(full_payable_days) / f64::from(full_present_days),
    })
}
