//! # folio-settle
//!
//! The monthly settlement pipeline: turns consumption events into revenue,
//! royalty, commission and editor income records.
//!
//! ## Modules
//!
//! - [`proration`] — consumption events → month-scoped revenue records
//! - [`royalty`] — revenue records → author royalties
//! - [`commission`] — revenue + royalties → multi-level referral commissions
//! - [`editor`] — champion income → editor/chief-editor income ledger
//!
//! Each generator is an operator-triggered batch over one calendar month.
//! Revenue, royalty and commission generation run in one all-or-nothing
//! transaction per month and refuse to run twice; editor distribution
//! commits per novel and accumulates instead.

pub mod commission;
pub mod editor;
pub mod proration;
pub mod royalty;

pub use folio_types::report::{BatchReport, EditorBatchOutcome, EditorDistribution};

/// Error types for settlement operations.
#[derive(Debug, thiserror::Error)]
pub enum SettleError {
    /// The operator-supplied month token is malformed.
    #[error(transparent)]
    InvalidMonth(#[from] folio_types::month::MonthParseError),

    /// The month already has rows in the target table; generation is
    /// write-once per month.
    #[error("{table} already generated for {month}, delete the month first")]
    AlreadyGenerated {
        /// The populated output table.
        table: &'static str,
        /// The refused batch month.
        month: String,
    },

    /// Deletion refused because downstream accounting has settled the month.
    #[error("{table} rows for {month} are settled and cannot be deleted")]
    MonthSettled {
        table: &'static str,
        month: String,
    },

    /// Storage failure; the month's transaction has been rolled back.
    #[error(transparent)]
    Db(#[from] folio_db::DbError),
}

/// Convenience result type for settlement operations.
pub type Result<T> = std::result::Result<T, SettleError>;
