//! SQLite ingestion adapter: round trips, range bounds, and paging.

use cfa_core::{
    config::ScoringConfig,
    engine::{BatchOutcome, CfaEngine},
    sample::generate_population,
    store::RecordStore,
    types::DailyRecord,
};
use chrono::{Days, NaiveDate};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn store() -> RecordStore {
    let store = RecordStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

#[test]
fn optional_fields_round_trip() {
    let store = store();
    let record = DailyRecord {
        user_id:            "u-1".into(),
        calendar_date:      as_of(),
        end_of_day_balance: None,
        daily_income:       Some(12.5),
        daily_expenses:     None,
    };
    store.insert_record(&record).unwrap();

    let back = store
        .records_for_user("u-1", as_of().pred_opt().unwrap(), as_of())
        .unwrap();
    assert_eq!(back, vec![record]);
}

#[test]
fn range_is_exclusive_below_inclusive_above() {
    let store = store();
    let records: Vec<_> = (0..10)
        .map(|i| DailyRecord::new("u-1", as_of() - Days::new(i), 100.0))
        .collect();
    store.insert_records(&records).unwrap();

    let since = as_of() - Days::new(5);
    let got = store.records_for_user("u-1", since, as_of()).unwrap();
    assert_eq!(got.len(), 5);
    assert_eq!(got.first().unwrap().calendar_date, as_of() - Days::new(4));
    assert_eq!(got.last().unwrap().calendar_date, as_of());
}

#[test]
fn duplicate_day_is_rejected_by_schema() {
    let store = store();
    let r = DailyRecord::new("u-1", as_of(), 1.0);
    store.insert_record(&r).unwrap();
    assert!(store.insert_record(&r).is_err());
}

#[test]
fn paging_visits_every_user_once() {
    let store = store();
    store
        .insert_records(&generate_population(20, 30, as_of(), 1))
        .unwrap();
    assert_eq!(store.user_count().unwrap(), 20);

    let mut pages = Vec::new();
    store
        .for_each_user_page(7, as_of() - Days::new(200), as_of(), |page| {
            pages.push(page.keys().cloned().collect::<Vec<_>>());
            Ok(())
        })
        .unwrap();

    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![7, 7, 6]);
    let all: Vec<String> = pages.concat();
    let mut sorted = all.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(all, sorted);
    assert_eq!(all.len(), 20);
}

#[test]
fn paged_store_scoring_matches_in_memory_scoring() {
    let config = ScoringConfig::reference(as_of());
    let engine = CfaEngine::new(config.clone()).unwrap();
    let records = generate_population(25, 180, as_of(), 11);

    let store = store();
    store.insert_records(&records).unwrap();

    let mut paged = BatchOutcome::default();
    store
        .for_each_user_page(4, config.full_window_start(), as_of(), |page| {
            paged.merge(engine.score_users(page));
            Ok(())
        })
        .unwrap();

    let direct = engine.score_records(records);
    assert_eq!(paged, direct);
}

#[test]
fn file_backed_store_opens_in_wal_mode_and_persists() {
    let path = std::env::temp_dir().join(format!("cfa-store-{}.db", std::process::id()));
    let path = path.to_str().unwrap().to_string();
    let _ = std::fs::remove_file(&path);

    {
        let store = RecordStore::open(&path).unwrap();
        store.migrate().unwrap();
        store
            .insert_record(&DailyRecord::new("u-1", as_of(), 10.0))
            .unwrap();
    }

    let reopened = RecordStore::open(&path).unwrap();
    assert_eq!(reopened.user_count().unwrap(), 1);

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}
