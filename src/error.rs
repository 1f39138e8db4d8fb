use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerInsightsError {
    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Ledger source failure: {0}")]
    Source(String),

    #[error("Settings store failure: {0}")]
    Settings(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerInsightsError>;
