//! `colcheck-verify`: verification and correction of wizard-typed columns.
//!
//! Pure engine crate: talks to the data only through `TableHost`, never
//! touches files or the network itself.

pub mod batch;
pub mod classify;
pub mod error;
pub mod finalize;
pub mod message;
pub mod session;
pub mod verdict;
pub mod wizard;

pub use batch::{check_column, check_columns, run_verification, ColumnCheck, Verification};
pub use classify::{classify, reduce};
pub use error::SessionError;
pub use message::{Framing, Prompt};
pub use session::{Action, Alert, CorrectionSession, QueueEntry, SessionOptions, SessionState, View};
pub use verdict::evaluate;
pub use wizard::{Chrome, Wizard};
