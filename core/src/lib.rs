//! Cash Flow Affordability scoring.
//!
//! Turns a user's daily end-of-day balances into a CFA score and a credit
//! tier. The engine is a pure function of (records, config); ingestion,
//! rendering, and synthetic data live in their own modules around it.

pub mod aggregate;
pub mod capacity;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod report;
pub mod rng;
pub mod sample;
pub mod score;
pub mod store;
pub mod tier;
pub mod types;
pub mod window;
