//! Synthetic balance histories for demos and tests.
//!
//! Each profile starts from a base balance, receives income every
//! `income_every_days`, and spends a jittered daily amount. A balance that
//! sinks below the overdraft floor is reset, standing in for an emergency
//! deposit.

use crate::{
    rng::UserRng,
    types::{DailyRecord, UserId},
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

const OVERDRAFT_FLOOR: f64 = -100.0;
const EMERGENCY_DEPOSIT_BALANCE: f64 = 50.0;
const EXPENSE_JITTER: (i64, i64) = (-10, 15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleProfile {
    Starter,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileParams {
    pub base_balance:      f64,
    pub income_every_days: u64,
    pub income_amount:     f64,
    pub daily_expense:     f64,
}

impl SampleProfile {
    pub const ALL: [SampleProfile; 3] = [
        SampleProfile::Starter,
        SampleProfile::Standard,
        SampleProfile::Premium,
    ];

    pub fn params(&self) -> ProfileParams {
        match self {
            SampleProfile::Starter => ProfileParams {
                base_balance:      300.0,
                income_every_days: 14,
                income_amount:     600.0,
                daily_expense:     25.0,
            },
            SampleProfile::Standard => ProfileParams {
                base_balance:      500.0,
                income_every_days: 14,
                income_amount:     800.0,
                daily_expense:     30.0,
            },
            SampleProfile::Premium => ProfileParams {
                base_balance:      800.0,
                income_every_days: 14,
                income_amount:     1000.0,
                daily_expense:     35.0,
            },
        }
    }
}

/// `days` consecutive records for one user, the last one dated `as_of`.
pub fn generate_user(
    user_id: &str,
    profile: SampleProfile,
    days: u64,
    as_of: NaiveDate,
    rng: &mut UserRng,
) -> Vec<DailyRecord> {
    let p = profile.params();
    let Some(first) = days
        .checked_sub(1)
        .and_then(|back| as_of.checked_sub_days(Days::new(back)))
    else {
        return Vec::new();
    };

    let mut balance = p.base_balance;
    let mut records = Vec::with_capacity(days as usize);

    for i in 0..days {
        let Some(date) = first.checked_add_days(Days::new(i)) else {
            break;
        };
        let income = if i % p.income_every_days == 0 { p.income_amount } else { 0.0 };
        let expenses = p.daily_expense + rng.range_i64(EXPENSE_JITTER.0, EXPENSE_JITTER.1) as f64;

        balance = balance + income - expenses;
        if balance < OVERDRAFT_FLOOR {
            balance = EMERGENCY_DEPOSIT_BALANCE;
        }

        records.push(DailyRecord {
            user_id:            user_id.to_string(),
            calendar_date:      date,
            end_of_day_balance: Some((balance * 100.0).round() / 100.0),
            daily_income:       Some(income),
            daily_expenses:     Some(expenses),
        });
    }
    records
}

/// `users` synthetic users cycling through the profiles. Ids are
/// zero-padded so they sort in generation order.
pub fn generate_population(users: usize, days: u64, as_of: NaiveDate, seed: u64) -> Vec<DailyRecord> {
    (0..users)
        .flat_map(|i| {
            let user_id: UserId = format!("u-{i:06}");
            let profile = SampleProfile::ALL[i % SampleProfile::ALL.len()];
            let mut rng = UserRng::new(seed, i as u64);
            generate_user(&user_id, profile, days, as_of, &mut rng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn history_ends_on_as_of_and_is_contiguous() {
        let mut rng = UserRng::new(42, 0);
        let records = generate_user("u", SampleProfile::Standard, 180, as_of(), &mut rng);
        assert_eq!(records.len(), 180);
        assert_eq!(records.last().unwrap().calendar_date, as_of());
        assert!(records
            .windows(2)
            .all(|w| (w[1].calendar_date - w[0].calendar_date).num_days() == 1));
    }

    #[test]
    fn income_lands_on_biweekly_boundary() {
        let mut rng = UserRng::new(42, 0);
        let records = generate_user("u", SampleProfile::Premium, 30, as_of(), &mut rng);
        let paydays: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.daily_income == Some(1000.0))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(paydays, vec![0, 14, 28]);
    }

    #[test]
    fn balance_never_below_overdraft_floor() {
        let records = generate_population(9, 180, as_of(), 7);
        assert!(records
            .iter()
            .all(|r| r.end_of_day_balance.unwrap() >= OVERDRAFT_FLOOR));
    }

    #[test]
    fn zero_days_is_empty() {
        let mut rng = UserRng::new(1, 1);
        assert!(generate_user("u", SampleProfile::Starter, 0, as_of(), &mut rng).is_empty());
    }
}
