use super::entry::EntryId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unknown tax year: {0}")]
    UnknownTaxYear(String),
    #[error("invalid tax year '{0}', expected YYYY/YYYY")]
    InvalidTaxYear(String),
    #[error("entry description must not be empty")]
    EmptyDescription,
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("invalid rate schedule for {year}: {reason}")]
    InvalidSchedule { year: String, reason: String },
}
