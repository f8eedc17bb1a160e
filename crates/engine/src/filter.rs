//! Row filters - view layer over the table
//!
//! Facets restrict which data rows are visible. A facet keeps a row when the
//! row's transformed value (its probe evaluated on the facet's column) equals
//! the selected choice. Several facets combine with AND.
//!
//! Key invariants:
//! - At most one facet per column; adding a second replaces the first
//! - visible_mask is indexed by DATA row
//! - Classification never reads the mask: value counts cover every row

use colcheck_core::{HostError, RowFilter};

use crate::expr::Probe;
use crate::table::Table;

// =============================================================================
// RowView: visibility mask over data rows
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RowView {
    /// true = visible, false = hidden by a facet
    visible_mask: Vec<bool>,

    /// Cached visible data rows, in order
    visible_rows: Vec<usize>,
}

impl RowView {
    /// All `row_count` rows visible
    pub fn new(row_count: usize) -> Self {
        Self {
            visible_mask: vec![true; row_count],
            visible_rows: (0..row_count).collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.visible_mask.len()
    }

    pub fn visible_count(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn visible_rows(&self) -> &[usize] {
        &self.visible_rows
    }

    pub fn is_visible(&self, row: usize) -> bool {
        row < self.visible_mask.len() && self.visible_mask[row]
    }

    pub fn is_filtered(&self) -> bool {
        self.visible_count() < self.row_count()
    }

    pub fn apply_filter(&mut self, visible_mask: Vec<bool>) {
        self.visible_mask = visible_mask;
        self.rebuild_visible_cache();
    }

    pub fn clear_filter(&mut self) {
        self.visible_mask = vec![true; self.visible_mask.len()];
        self.rebuild_visible_cache();
    }

    fn rebuild_visible_cache(&mut self) {
        self.visible_rows = self
            .visible_mask
            .iter()
            .enumerate()
            .filter_map(|(row, &visible)| visible.then_some(row))
            .collect();
    }
}

// =============================================================================
// Facets
// =============================================================================

#[derive(Debug, Clone)]
struct Facet {
    filter: RowFilter,
    col: usize,
    probe: Probe,
}

impl Facet {
    fn keeps(&self, table: &Table, row: usize) -> bool {
        let raw = table.cell(row, self.col).unwrap_or("");
        self.probe.eval(raw) == self.filter.selected
    }
}

/// Active facets plus the view they produce.
#[derive(Debug, Clone, Default)]
pub struct FacetSet {
    facets: Vec<Facet>,
    view: RowView,
}

impl FacetSet {
    pub fn new(row_count: usize) -> Self {
        Self { facets: Vec::new(), view: RowView::new(row_count) }
    }

    /// Compile and install a facet, replacing any facet on the same column.
    pub fn add(&mut self, table: &Table, filter: &RowFilter) -> Result<(), HostError> {
        let col = table.column_index(&filter.column)?;
        let probe = Probe::compile(&filter.expression)?;
        self.facets.retain(|f| f.filter.column != filter.column);
        self.facets.push(Facet { filter: filter.clone(), col, probe });
        self.refresh(table);
        Ok(())
    }

    /// Remove the facet on `column`. Returns whether one was removed.
    pub fn remove(&mut self, table: &Table, column: &str) -> bool {
        let before = self.facets.len();
        self.facets.retain(|f| f.filter.column != column);
        let removed = self.facets.len() != before;
        if removed {
            self.refresh(table);
        }
        removed
    }

    pub fn clear(&mut self, table: &Table) {
        self.facets.clear();
        self.refresh(table);
    }

    /// Columns that currently carry a facet.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.facets.iter().map(|f| f.filter.column.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn view(&self) -> &RowView {
        &self.view
    }

    /// Recompute the visibility mask. Needed after any cell change since a
    /// facet's selection is evaluated against current values.
    pub fn refresh(&mut self, table: &Table) {
        if self.facets.is_empty() {
            self.view = RowView::new(table.row_count());
            return;
        }
        let mask = (0..table.row_count())
            .map(|row| self.facets.iter().all(|f| f.keeps(table, row)))
            .collect();
        if self.view.row_count() != table.row_count() {
            self.view = RowView::new(table.row_count());
        }
        self.view.apply_filter(mask);
    }
}
