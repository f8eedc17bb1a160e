//! In-process `TableHost`.

use colcheck_core::{
    CellEdit, Checkpoint, FlaggedCell, HostError, RowFilter, TableHost, ValueCounts,
};

use crate::expr::Probe;
use crate::filter::FacetSet;
use crate::history::{CellChange, History};
use crate::table::Table;

/// A table plus the facet and history state a host keeps around it.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    table: Table,
    facets: FacetSet,
    history: History,
}

impl MemoryHost {
    pub fn new(table: Table) -> Self {
        let facets = FacetSet::new(table.row_count());
        Self { table, facets, history: History::new() }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn facets(&self) -> &FacetSet {
        &self.facets
    }

    /// Apply a batch of edits as one history entry, the way a wizard's own
    /// transform lands in the host.
    pub fn apply_transform(&mut self, description: &str, edits: &[CellEdit]) -> Result<Checkpoint, HostError> {
        let mut changes = Vec::with_capacity(edits.len());
        for edit in edits {
            let col = self.table.column_index(&edit.column)?;
            let old = self.table.set_cell(edit.row, col, edit.value.clone())?;
            changes.push(CellChange { row: edit.row, col, old, new: edit.value.clone() });
        }
        self.facets.refresh(&self.table);
        Ok(self.history.record(description, changes))
    }
}

impl TableHost for MemoryHost {
    fn value_counts(&mut self, column: &str, expression: &str) -> Result<ValueCounts, HostError> {
        let col = self.table.column_index(column)?;
        let probe = Probe::compile(expression)?;

        // First-seen order is the bucket order.
        let mut counts = ValueCounts::new();
        for raw in self.table.column_values(col) {
            counts.add(&probe.eval(raw), 1);
        }

        log::debug!("value counts for '{}': {} bucket(s)", column, counts.len());
        Ok(counts)
    }

    fn row_count(&mut self) -> Result<usize, HostError> {
        Ok(self.table.row_count())
    }

    fn edit_cell(&mut self, edit: &CellEdit) -> Result<(), HostError> {
        let col = self.table.column_index(&edit.column)?;
        let old = self.table.set_cell(edit.row, col, edit.value.clone())?;
        let description = format!("Edit single cell on row {}, column {}", edit.row + 1, edit.column);
        self.history.record(
            description,
            vec![CellChange { row: edit.row, col, old, new: edit.value.clone() }],
        );
        self.facets.refresh(&self.table);
        Ok(())
    }

    fn add_row_filter(&mut self, filter: &RowFilter) -> Result<(), HostError> {
        self.facets.add(&self.table, filter)
    }

    fn remove_row_filter(&mut self, column: &str) -> Result<(), HostError> {
        self.facets.remove(&self.table, column);
        Ok(())
    }

    fn flagged_cells(&mut self, column: &str, limit: usize) -> Result<Vec<FlaggedCell>, HostError> {
        let col = self.table.column_index(column)?;
        Ok(self
            .facets
            .view()
            .visible_rows()
            .iter()
            .take(limit)
            .map(|&row| FlaggedCell {
                row,
                value: self.table.cell(row, col).unwrap_or("").to_string(),
            })
            .collect())
    }

    fn latest_checkpoint(&mut self) -> Result<Checkpoint, HostError> {
        Ok(self.history.latest())
    }

    fn undo_to(&mut self, checkpoint: Checkpoint) -> Result<(), HostError> {
        let undone = self.history.undo_to(checkpoint, &mut self.table)?;
        self.facets.refresh(&self.table);
        log::debug!("undid {} history entr(ies) back to {}", undone, checkpoint);
        Ok(())
    }
}
