//! Contract with the tabular-data host.
//!
//! Every call is blocking from the caller's point of view: it returns only
//! once the host has answered. Implementations: `colcheck_engine::MemoryHost`
//! (in process) and `colcheck_refine_client::RefineClient` (HTTP).

use serde::{Deserialize, Serialize};

use crate::verification::ValueCounts;

/// Transformed value produced for rows that do not parse as the expected type.
pub const ERROR_SENTINEL: &str = "error";

/// A point in the host's edit history that `undo_to` can return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Checkpoint(pub i64);

impl Checkpoint {
    /// Before any recorded change.
    pub const ORIGIN: Checkpoint = Checkpoint(0);
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Single-cell update. Row-scoped on purpose: other cells holding the same
/// old value are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellEdit {
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Row filter restricting the visible rows to those whose transformed value
/// equals `selected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub expression: String,
    pub selected: String,
}

impl RowFilter {
    /// Filter showing only the rows flagged by `expression`.
    pub fn flagged(column: &str, expression: &str) -> Self {
        Self {
            column: column.to_string(),
            expression: expression.to_string(),
            selected: ERROR_SENTINEL.to_string(),
        }
    }
}

/// Raw value of a visible cell, with the row it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedCell {
    pub row: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Transport failure (connection refused, timeout).
    Network(String),
    /// Non-success HTTP status with body.
    Http(u16, String),
    /// Response could not be decoded.
    Parse(String),
    /// The host reported a command failure.
    Command(String),
    /// Column is not part of the table.
    UnknownColumn(String),
    /// Transform expression could not be compiled.
    Expression(String),
    /// Row index outside the table.
    RowOutOfRange(usize),
    /// Checkpoint is not in the history.
    UnknownCheckpoint(Checkpoint),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Network(msg) => write!(f, "network error: {}", msg),
            HostError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            HostError::Parse(msg) => write!(f, "parse error: {}", msg),
            HostError::Command(msg) => write!(f, "host command failed: {}", msg),
            HostError::UnknownColumn(name) => write!(f, "unknown column '{}'", name),
            HostError::Expression(msg) => write!(f, "bad expression: {}", msg),
            HostError::RowOutOfRange(row) => write!(f, "row {} is out of range", row),
            HostError::UnknownCheckpoint(cp) => write!(f, "unknown checkpoint {}", cp),
        }
    }
}

impl std::error::Error for HostError {}

/// Query/command surface the verification core needs from the host.
pub trait TableHost {
    /// Group every row of `column` by the value of `expression`.
    fn value_counts(&mut self, column: &str, expression: &str) -> Result<ValueCounts, HostError>;

    /// Current total row count, ignoring filters.
    fn row_count(&mut self) -> Result<usize, HostError>;

    fn edit_cell(&mut self, edit: &CellEdit) -> Result<(), HostError>;

    /// Install a filter, replacing any filter already set on the column.
    fn add_row_filter(&mut self, filter: &RowFilter) -> Result<(), HostError>;

    /// Remove the filter on `column`. Removing a missing filter is a no-op.
    fn remove_row_filter(&mut self, column: &str) -> Result<(), HostError>;

    /// Raw values of `column` in the rows visible under the active filters,
    /// at most `limit` of them, in row order.
    fn flagged_cells(&mut self, column: &str, limit: usize) -> Result<Vec<FlaggedCell>, HostError>;

    /// Most recent entry of the edit history.
    fn latest_checkpoint(&mut self) -> Result<Checkpoint, HostError>;

    /// Revert every change made after `checkpoint`.
    fn undo_to(&mut self, checkpoint: Checkpoint) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_filter_selects_error_sentinel() {
        let filter = RowFilter::flagged("Postcode", "value");
        assert_eq!(filter.selected, "error");
        assert_eq!(filter.column, "Postcode");
    }

    #[test]
    fn host_error_display() {
        assert_eq!(HostError::Http(502, "bad gateway".into()).to_string(), "HTTP 502: bad gateway");
        assert_eq!(
            HostError::UnknownCheckpoint(Checkpoint(7)).to_string(),
            "unknown checkpoint #7"
        );
    }
}
