//! Daily capacity evaluator: one can-pay flag per day per tier.

use crate::{
    config::TierDefinition,
    types::{DailyRecord, TierNumber},
};
use chrono::NaiveDate;

/// `true` when the end-of-day balance covers the parcel. Inclusive.
#[inline]
pub fn can_pay(balance: f64, parcel: f64) -> bool {
    balance >= parcel
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCapacity {
    pub date:    NaiveDate,
    /// `None` when the day has no balance to compare.
    pub can_pay: Option<bool>,
}

/// Can-pay flags for one tier, aligned one-to-one with the window's days.
#[derive(Debug, Clone, PartialEq)]
pub struct CanPaySeries {
    pub tier_number: TierNumber,
    pub parcel:      f64,
    pub days:        Vec<DayCapacity>,
}

impl CanPaySeries {
    pub fn evaluate(records: &[DailyRecord], tier: &TierDefinition) -> Self {
        let days = records
            .iter()
            .map(|r| DayCapacity {
                date:    r.calendar_date,
                can_pay: r.end_of_day_balance.map(|b| can_pay(b, tier.biweekly_parcel)),
            })
            .collect();
        Self {
            tier_number: tier.tier_number,
            parcel:      tier.biweekly_parcel,
            days,
        }
    }

    pub fn payable_days(&self) -> u32 {
        self.days.iter().filter(|d| d.can_pay == Some(true)).count() as u32
    }

    pub fn present_days(&self) -> u32 {
        self.days.iter().filter(|d| d.can_pay.is_some()).count() as u32
    }

    /// Sub-series of days strictly after `start`.
    pub fn since(&self, start: NaiveDate) -> &[DayCapacity] {
        let offset = self.days.partition_point(|d| d.date <= start);
        &self.days[offset..]
    }
}

/// Count of payable days in a slice of a series.
pub fn payable_in(days: &[DayCapacity]) -> u32 {
    days.iter().filter(|d| d.can_pay == Some(true)).count() as u32
}

/// Longest run of consecutive payable days. A calendar gap or a day
/// without a balance breaks the run.
pub fn max_consecutive_payable(days: &[DayCapacity]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for d in days {
        let contiguous = prev.is_some_and(|p| (d.date - p).num_days() == 1);
        if d.can_pay == Some(true) {
            run = if contiguous { run + 1 } else { 1 };
            best = best.max(run);
        } else {
            run = 0;
        }
        prev = Some(d.date);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn tier(parcel: f64) -> TierDefinition {
        TierDefinition {
            tier_number:     2,
            label:           "Standard".into(),
            loan_amount:     150.0,
            term_days:       60,
            biweekly_parcel: parcel,
            score_threshold: 0.6,
            description:     String::new(),
        }
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn rec(offset: u64, balance: Option<f64>) -> DailyRecord {
        DailyRecord {
            user_id:            "u".into(),
            calendar_date:      start() + Days::new(offset),
            end_of_day_balance: balance,
            daily_income:       None,
            daily_expenses:     None,
        }
    }

    #[test]
    fn balance_equal_to_parcel_can_pay() {
        assert!(can_pay(39.72, 39.72));
        assert!(!can_pay(39.71, 39.72));
        assert!(!can_pay(-5.0, 39.72));
    }

    #[test]
    fn missing_balance_is_neither_payable_nor_present() {
        let records = vec![rec(0, Some(50.0)), rec(1, None), rec(2, Some(10.0))];
        let series = CanPaySeries::evaluate(&records, &tier(39.72));
        assert_eq!(series.payable_days(), 1);
        assert_eq!(series.present_days(), 2);
        assert_eq!(series.days[1].can_pay, None);
    }

    #[test]
    fn since_excludes_start_date() {
        let records: Vec<_> = (0..10).map(|i| rec(i, Some(100.0))).collect();
        let series = CanPaySeries::evaluate(&records, &tier(1.0));
        let tail = series.since(start() + Days::new(4));
        assert_eq!(tail.len(), 5);
        assert_eq!(payable_in(tail), 5);
    }

    #[test]
    fn consecutive_run_breaks_on_gap_and_missing() {
        let records = vec![
            rec(0, Some(100.0)),
            rec(1, Some(100.0)),
            rec(2, Some(100.0)),
            rec(3, None),
            rec(4, Some(100.0)),
            rec(6, Some(100.0)),
            rec(7, Some(100.0)),
        ];
        let series = CanPaySeries::evaluate(&records, &tier(1.0));
        assert_eq!(max_consecutive_payable(&series.days), 3);
    }
}
