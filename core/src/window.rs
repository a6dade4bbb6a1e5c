//! Window builder: slices a user's history into the full and recent windows
//! and applies the activity gate.
//!
//! Both windows are half-open on the left: `(start, as_of]`. The recent
//! window is a suffix of the full window, so it is exposed as a slice of
//! the same sorted buffer rather than a second copy.

use crate::{
    config::ScoringConfig,
    error::{CfaError, CfaResult},
    types::{DailyRecord, UserId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a user was left out of the scored population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    /// No activity at all on or before as-of.
    NoActivity,
    /// Last active day is too far behind as-of.
    StaleActivity { last_active: NaiveDate, days_since: i64 },
    /// Too few distinct active days in the full window.
    TooFewActiveDays { active_days: u32, required: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserWindow {
    pub user_id:      UserId,
    pub as_of:        NaiveDate,
    pub full_start:   NaiveDate,
    pub recent_start: NaiveDate,
    /// Full-window records, ascending by date.
    full:             Vec<DailyRecord>,
    /// Index of the first record inside the recent window.
    recent_offset:    usize,
}

impl UserWindow {
    pub fn full(&self) -> &[DailyRecord] {
        &self.full
    }

    pub fn recent(&self) -> &[DailyRecord] {
        &self.full[self.recent_offset..]
    }

    /// Days with a balance value; the full-ratio denominator.
    pub fn present_days(&self) -> usize {
        self.full
            .iter()
            .filter(|r| r.end_of_day_balance.is_some())
            .count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Eligible(UserWindow),
    Ineligible(Ineligibility),
}

/// Build the windows for one user and decide eligibility.
///
/// Records may arrive in any order; duplicates on the same date are an
/// input defect for that user only.
pub fn build_window(
    user_id: &str,
    mut records: Vec<DailyRecord>,
    config: &ScoringConfig,
) -> CfaResult<WindowOutcome> {
    let as_of = config.as_of_date;
    let full_start = config.full_window_start();
    let recent_start = config.recent_window_start();

    records.sort_by_key(|r| r.calendar_date);
    if let Some(pair) = records
        .windows(2)
        .find(|w| w[0].calendar_date == w[1].calendar_date)
    {
        return Err(CfaError::DuplicateDate {
            user_id: user_id.to_string(),
            date:    pair[0].calendar_date,
        });
    }

    // Activity recency looks at everything up to as-of, not just the window.
    let last_active = records
        .iter()
        .rev()
        .filter(|r| r.calendar_date <= as_of)
        .find(|r| r.is_active())
        .map(|r| r.calendar_date);

    let Some(last_active) = last_active else {
        return Ok(WindowOutcome::Ineligible(Ineligibility::NoActivity));
    };

    let days_since = (as_of - last_active).num_days();
    if days_since > i64::from(config.activity_recency_days) {
        return Ok(WindowOutcome::Ineligible(Ineligibility::StaleActivity {
            last_active,
            days_since,
        }));
    }

    let full: Vec<DailyRecord> = records
        .into_iter()
        .filter(|r| r.calendar_date > full_start && r.calendar_date <= as_of)
        .collect();

    let active_days = full.iter().filter(|r| r.is_active()).count() as u32;
    if active_days < config.min_active_days {
        return Ok(WindowOutcome::Ineligible(Ineligibility::TooFewActiveDays {
            active_days,
            required: config.min_active_days,
        }));
    }

    let recent_offset = full.partition_point(|r| r.calendar_date <= recent_start);

    Ok(WindowOutcome::Eligible(UserWindow {
        user_id: user_id.to_string(),
        as_of,
        full_start,
        recent_start,
        full,
        recent_offset,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn day(back: u64) -> NaiveDate {
        as_of().checked_sub_days(Days::new(back)).unwrap()
    }

    fn active(back: u64, balance: f64) -> DailyRecord {
        DailyRecord::new("u", day(back), balance).with_flows(10.0, 5.0)
    }

    #[test]
    fn recent_is_suffix_of_full() {
        let cfg = ScoringConfig::reference(as_of());
        let records: Vec<_> = (0..200).map(|b| active(b, 100.0)).collect();
        let WindowOutcome::Eligible(w) = build_window("u", records, &cfg).unwrap() else {
            panic!("expected eligible");
        };
        assert_eq!(w.recent().len(), 90);
        assert!(w.recent().iter().all(|r| r.calendar_date > w.recent_start));
        assert!(w.full().iter().all(|r| r.calendar_date > w.full_start));
        assert_eq!(w.full().last().unwrap().calendar_date, as_of());
    }

    #[test]
    fn records_after_as_of_are_ignored() {
        let cfg = ScoringConfig::reference(as_of());
        let mut records: Vec<_> = (0..30).map(|b| active(b, 100.0)).collect();
        records.push(DailyRecord::new("u", as_of() + Days::new(3), 1.0).with_flows(1.0, 0.0));
        let WindowOutcome::Eligible(w) = build_window("u", records, &cfg).unwrap() else {
            panic!("expected eligible");
        };
        assert_eq!(w.full().len(), 30);
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let cfg = ScoringConfig::reference(as_of());
        let records = vec![active(1, 1.0), active(1, 2.0)];
        let err = build_window("u", records, &cfg).unwrap_err();
        assert!(matches!(err, CfaError::DuplicateDate { .. }));
    }

    #[test]
    fn recency_gate_is_inclusive_at_boundary() {
        let cfg = ScoringConfig::reference(as_of());
        let records: Vec<_> = (90..100).map(|b| active(b, 100.0)).collect();
        let outcome = build_window("u", records, &cfg).unwrap();
        assert!(matches!(outcome, WindowOutcome::Eligible(_)));

        let records: Vec<_> = (91..101).map(|b| active(b, 100.0)).collect();
        let outcome = build_window("u", records, &cfg).unwrap();
        assert!(matches!(
            outcome,
            WindowOutcome::Ineligible(Ineligibility::StaleActivity { days_since: 91, .. })
        ));
    }

    #[test]
    fn balance_only_days_do_not_count_as_active() {
        let cfg = ScoringConfig::reference(as_of());
        let mut records: Vec<_> = (0..6).map(|b| active(b, 100.0)).collect();
        records.extend((6..60).map(|b| DailyRecord::new("u", day(b), 100.0).with_flows(0.0, 0.0)));
        let outcome = build_window("u", records, &cfg).unwrap();
        assert_eq!(
            outcome,
            WindowOutcome::Ineligible(Ineligibility::TooFewActiveDays {
                active_days: 6,
                required: 7,
            })
        );
    }
}
