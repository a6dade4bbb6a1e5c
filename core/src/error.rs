use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CfaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("User '{user_id}' has no balance-bearing days in the full window")]
    EmptyWindow { user_id: String },

    #[error("User '{user_id}' has more than one record for {date}")]
    DuplicateDate { user_id: String, date: NaiveDate },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CfaResult<T> = Result<T, CfaError>;
