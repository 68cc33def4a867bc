pub mod aggregate;
pub mod analysis;
pub mod bracket;
pub mod classify;
pub mod entry;
pub mod error;
pub mod history;
pub mod relief;
pub mod snapshot;
pub mod taxonomy;
pub mod warnings;
pub mod year;

// Flat public surface for domain types and functions.
pub use aggregate::{aggregate, Aggregate, CategorySummary};
pub use analysis::{
    ingest, read_input_json, read_records_csv, DocumentAnalysis, Ingest, TaxInput,
};
pub use bracket::{compute_tax, Bracket, BracketSlice, Schedule, ScheduleError, TaxComputation};
pub use classify::{classify, ClassifiedRecord, MatchSource, RawRecord, RULES};
pub use entry::{parse_amount, Entry, EntryId, Provenance};
pub use error::EngineError;
pub use history::{EditSession, HistoryStack};
pub use relief::{
    balance_payable, check_qualifying_caps, resolve_reliefs, QualifyingPayment, ReliefBreakdown,
    TaxCredits,
};
pub use snapshot::{assess, assess_with_rates, AggregateSnapshot};
pub use taxonomy::{Category, CategoryType, CreditKind, EntryKind, WhtSource};
pub use warnings::Warning;
pub use year::{RateTable, RateTableInput, TaxYear, YearRates};
