//! SQLite ingestion adapter.
//!
//! RULE: Only store.rs talks to the database.
//! The engine never sees a connection; it receives plain `DailyRecord`s,
//! fetched one page of users at a time to bound memory.

use crate::{
    error::CfaResult,
    types::{DailyRecord, UserId},
};
use chrono::NaiveDate;
use rusqlite::{params, types::Type, Connection, Row};
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the balance database at `path`.
    pub fn open(path: &str) -> CfaResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests and sample runs).
    pub fn in_memory() -> CfaResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> CfaResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_daily_balance.sql"))?;
        Ok(())
    }

    // ── Writes ─────────────────────────────────────────────────

    pub fn insert_record(&self, record: &DailyRecord) -> CfaResult<()> {
        self.conn.execute(
            "INSERT INTO daily_balance (user_id, calendar_date, balance, daily_income, daily_expenses)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.user_id,
                record.calendar_date.format(DATE_FORMAT).to_string(),
                record.end_of_day_balance,
                record.daily_income,
                record.daily_expenses,
            ],
        )?;
        Ok(())
    }

    /// Bulk insert inside one transaction.
    pub fn insert_records(&self, records: &[DailyRecord]) -> CfaResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO daily_balance (user_id, calendar_date, balance, daily_income, daily_expenses)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.user_id,
                    r.calendar_date.format(DATE_FORMAT).to_string(),
                    r.end_of_day_balance,
                    r.daily_income,
                    r.daily_expenses,
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("inserted {} daily records", records.len());
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn user_count(&self) -> CfaResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(DISTINCT user_id) FROM daily_balance",
            [],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// Keyset pagination over user ids: up to `limit` ids strictly after
    /// `after`, ascending.
    pub fn user_ids_page(&self, after: Option<&str>, limit: usize) -> CfaResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT user_id FROM daily_balance
             WHERE ?1 IS NULL OR user_id > ?1
             ORDER BY user_id ASC
             LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![after, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<UserId>, _>>()?;
        Ok(ids)
    }

    /// One user's records with date in `(since, until]`, ascending.
    pub fn records_for_user(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> CfaResult<Vec<DailyRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT user_id, calendar_date, balance, daily_income, daily_expenses
             FROM daily_balance
             WHERE user_id = ?1 AND calendar_date > ?2 AND calendar_date <= ?3
             ORDER BY calendar_date ASC",
        )?;
        let records = stmt
            .query_map(
                params![
                    user_id,
                    since.format(DATE_FORMAT).to_string(),
                    until.format(DATE_FORMAT).to_string(),
                ],
                record_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Walk every user in pages of `page_size`, handing each page of
    /// `(since, until]` records to `visit`. Users with no rows in range
    /// still appear, with an empty history.
    pub fn for_each_user_page<F>(
        &self,
        page_size: usize,
        since: NaiveDate,
        until: NaiveDate,
        mut visit: F,
    ) -> CfaResult<()>
    where
        F: FnMut(BTreeMap<UserId, Vec<DailyRecord>>) -> CfaResult<()>,
    {
        let page_size = page_size.max(1);
        let mut cursor: Option<UserId> = None;
        loop {
            let ids = self.user_ids_page(cursor.as_deref(), page_size)?;
            let Some(last) = ids.last().cloned() else {
                break;
            };
            let mut page = BTreeMap::new();
            for id in ids {
                let records = self.records_for_user(&id, since, until)?;
                page.insert(id, records);
            }
            log::debug!("fetched page of {} users ending at {last}", page.len());
            visit(page)?;
            cursor = Some(last);
        }
        Ok(())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<DailyRecord> {
    let date_text: String = row.get(1)?;
    let calendar_date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(DailyRecord {
        user_id:            row.get(0)?,
        calendar_date,
        end_of_day_balance: row.get(2)?,
        daily_income:       row.get(3)?,
        daily_expenses:     row.get(4)?,
    })
}
