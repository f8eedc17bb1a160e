use std::io::{Read, Write};

use colcheck_core::HostError;

/// Rectangular string table: named columns, rows of raw cell text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Load CSV with a header row. Ragged records are padded.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self, String> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| format!("cannot read CSV header: {}", e))?;
        let mut table = Table::new(headers.iter().map(|h| h.trim().to_string()).collect());

        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| format!("CSV record {}: {}", i + 1, e))?;
            table.push_row(record.iter().map(String::from).collect());
        }

        Ok(table)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), String> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns).map_err(|e| e.to_string())?;
        for row in &self.rows {
            wtr.write_record(row).map_err(|e| e.to_string())?;
        }
        wtr.flush().map_err(|e| e.to_string())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, HostError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HostError::UnknownColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Replace a cell, returning the previous value.
    pub fn set_cell(&mut self, row: usize, col: usize, value: String) -> Result<String, HostError> {
        let slot = self
            .rows
            .get_mut(row)
            .ok_or(HostError::RowOutOfRange(row))?
            .get_mut(col)
            .ok_or(HostError::RowOutOfRange(row))?;
        Ok(std::mem::replace(slot, value))
    }

    /// Iterate one column's values in row order.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |r| r.get(col).map(String::as_str).unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Name, Postcode\nAda,SW1A 1AA\nGrace\nLinus,M1 1AE,extra\n";

    #[test]
    fn loads_csv_with_ragged_rows() {
        let table = Table::from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Name".to_string(), "Postcode".to_string()]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(1, 1), Some(""));
        assert_eq!(table.cell(2, 1), Some("M1 1AE"));
        assert_eq!(table.cell(2, 2), None);
    }

    #[test]
    fn set_cell_returns_old_value() {
        let mut table = Table::from_csv(CSV.as_bytes()).unwrap();
        let old = table.set_cell(0, 1, "EC1A 1BB".into()).unwrap();
        assert_eq!(old, "SW1A 1AA");
        assert_eq!(table.cell(0, 1), Some("EC1A 1BB"));
        assert_eq!(table.set_cell(9, 0, "x".into()), Err(HostError::RowOutOfRange(9)));
    }

    #[test]
    fn unknown_column_is_an_error() {
        let table = Table::from_csv(CSV.as_bytes()).unwrap();
        assert_eq!(table.column_index("Postcode"), Ok(1));
        assert_eq!(table.column_index("Town"), Err(HostError::UnknownColumn("Town".into())));
    }

    #[test]
    fn csv_round_trip_keeps_edits() {
        let mut table = Table::from_csv(CSV.as_bytes()).unwrap();
        table.set_cell(1, 1, "N1 9GU".into()).unwrap();
        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Name,Postcode\n"));
        assert!(text.contains("Grace,N1 9GU\n"));
    }
}
