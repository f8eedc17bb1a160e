//! `colcheck-core`: types shared by every colcheck crate.
//!
//! The verification model (requests, bucket counts, verdicts) and the
//! `TableHost` contract that both the in-memory engine and the HTTP client
//! implement. No IO.

pub mod host;
pub mod verification;

pub use host::{CellEdit, Checkpoint, FlaggedCell, HostError, RowFilter, TableHost, ERROR_SENTINEL};
pub use verification::{
    ClassificationResult, Severity, ValueCounts, Verdict, VerdictReason, VerificationRequest,
    WizardColumn,
};
