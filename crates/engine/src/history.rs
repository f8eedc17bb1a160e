//! Edit history with checkpoints.
//!
//! Each recorded entry gets the next id; the entry's id is the checkpoint
//! reached once it is applied. `Checkpoint::ORIGIN` is the state before the
//! first entry.

use colcheck_core::{Checkpoint, HostError};

use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub row: usize,
    pub col: usize,
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: i64,
    pub description: String,
    pub changes: Vec<CellChange>,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    next_id: i64,
}

impl History {
    pub fn new() -> Self {
        Self { entries: Vec::new(), next_id: 1 }
    }

    pub fn record(&mut self, description: impl Into<String>, changes: Vec<CellChange>) -> Checkpoint {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(HistoryEntry { id, description: description.into(), changes });
        Checkpoint(id)
    }

    pub fn latest(&self) -> Checkpoint {
        self.entries.last().map(|e| Checkpoint(e.id)).unwrap_or(Checkpoint::ORIGIN)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Revert, newest first, every entry recorded after `checkpoint`.
    /// Returns how many entries were undone.
    pub fn undo_to(&mut self, checkpoint: Checkpoint, table: &mut Table) -> Result<usize, HostError> {
        let keep = if checkpoint == Checkpoint::ORIGIN {
            0
        } else {
            self.entries
                .iter()
                .position(|e| e.id == checkpoint.0)
                .map(|i| i + 1)
                .ok_or(HostError::UnknownCheckpoint(checkpoint))?
        };

        let undone = self.entries.split_off(keep);
        for entry in undone.iter().rev() {
            for change in entry.changes.iter().rev() {
                table.set_cell(change.row, change.col, change.old.clone())?;
            }
        }
        Ok(undone.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_csv("A\none\ntwo\n".as_bytes()).unwrap()
    }

    fn edit(table: &mut Table, history: &mut History, row: usize, value: &str) -> Checkpoint {
        let old = table.set_cell(row, 0, value.to_string()).unwrap();
        history.record(
            format!("edit row {}", row),
            vec![CellChange { row, col: 0, old, new: value.to_string() }],
        )
    }

    #[test]
    fn empty_history_is_at_origin() {
        assert_eq!(History::new().latest(), Checkpoint::ORIGIN);
    }

    #[test]
    fn undo_to_checkpoint_reverts_later_edits() {
        let mut t = table();
        let mut h = History::new();
        let first = edit(&mut t, &mut h, 0, "uno");
        edit(&mut t, &mut h, 1, "dos");
        edit(&mut t, &mut h, 0, "eins");

        assert_eq!(h.undo_to(first, &mut t).unwrap(), 2);
        assert_eq!(t.cell(0, 0), Some("uno"));
        assert_eq!(t.cell(1, 0), Some("two"));
        assert_eq!(h.latest(), first);
    }

    #[test]
    fn undo_to_origin_reverts_everything() {
        let mut t = table();
        let mut h = History::new();
        edit(&mut t, &mut h, 0, "uno");
        edit(&mut t, &mut h, 0, "eins");
        h.undo_to(Checkpoint::ORIGIN, &mut t).unwrap();
        assert_eq!(t.cell(0, 0), Some("one"));
        assert!(h.entries().is_empty());
    }

    #[test]
    fn ids_keep_increasing_after_undo() {
        let mut t = table();
        let mut h = History::new();
        let a = edit(&mut t, &mut h, 0, "uno");
        h.undo_to(Checkpoint::ORIGIN, &mut t).unwrap();
        let b = edit(&mut t, &mut h, 0, "eins");
        assert!(b > a);
    }

    #[test]
    fn unknown_checkpoint_is_rejected() {
        let mut t = table();
        let mut h = History::new();
        edit(&mut t, &mut h, 0, "uno");
        assert_eq!(
            h.undo_to(Checkpoint(42), &mut t),
            Err(HostError::UnknownCheckpoint(Checkpoint(42)))
        );
        assert_eq!(t.cell(0, 0), Some("uno"));
    }
}
