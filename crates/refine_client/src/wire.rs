//! Request bodies and response decoding for the `/command/core/*` endpoints.

use serde::Deserialize;
use serde_json::{json, Value};

use colcheck_core::{Checkpoint, FlaggedCell, HostError, RowFilter, ValueCounts};

/// One entry of `columnModel.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub cell_index: usize,
}

fn list_facet(column: &str, expression: &str, selection: Value) -> Value {
    json!({
        "type": "list",
        "name": column,
        "columnName": column,
        "expression": expression,
        "omitBlank": false,
        "omitError": false,
        "selection": selection,
        "selectBlank": false,
        "selectError": false,
        "invert": false,
    })
}

/// Engine with one unselected list facet, for a grouping query.
pub(crate) fn grouping_engine(column: &str, expression: &str) -> String {
    json!({
        "facets": [list_facet(column, expression, json!([]))],
        "mode": "row-based",
    })
    .to_string()
}

/// Engine restricting rows to every active filter's selected choice.
pub(crate) fn filter_engine(filters: &[RowFilter]) -> String {
    let facets: Vec<Value> = filters
        .iter()
        .map(|f| {
            let choice = json!([{ "v": { "v": f.selected, "l": f.selected } }]);
            list_facet(&f.column, &f.expression, choice)
        })
        .collect();
    json!({ "facets": facets, "mode": "row-based" }).to_string()
}

/// Buckets of the facet computed for `column`, in returned order.
pub(crate) fn parse_value_counts(json: &Value, column: &str) -> Result<ValueCounts, HostError> {
    let facet = json["facets"]
        .as_array()
        .and_then(|facets| facets.iter().find(|f| f["columnName"].as_str() == Some(column)))
        .ok_or_else(|| HostError::Parse(format!("no facet for column '{}' in response", column)))?;

    if let Some(err) = facet["error"].as_str() {
        return Err(HostError::Command(err.to_string()));
    }

    let mut counts = ValueCounts::new();
    if let Some(choices) = facet["choices"].as_array() {
        for choice in choices {
            let label = choice["v"]["l"]
                .as_str()
                .ok_or_else(|| HostError::Parse("facet choice without label".into()))?;
            let count = choice["c"]
                .as_u64()
                .ok_or_else(|| HostError::Parse("facet choice without count".into()))?;
            counts.add(label, count as usize);
        }
    }
    Ok(counts)
}

pub(crate) fn parse_total(json: &Value) -> Result<usize, HostError> {
    json["total"]
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| HostError::Parse("missing total in response".into()))
}

/// Raw cell text; numbers and booleans are rendered, null is empty.
fn cell_text(cell: &Value) -> String {
    match &cell["v"] {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn parse_rows(json: &Value, cell_index: usize) -> Result<Vec<FlaggedCell>, HostError> {
    let rows = json["rows"]
        .as_array()
        .ok_or_else(|| HostError::Parse("missing rows in response".into()))?;
    rows.iter()
        .map(|row| {
            let index = row["i"]
                .as_u64()
                .ok_or_else(|| HostError::Parse("row without index".into()))?;
            let value = row["cells"]
                .get(cell_index)
                .map(cell_text)
                .unwrap_or_default();
            Ok(FlaggedCell { row: index as usize, value })
        })
        .collect()
}

pub(crate) fn parse_columns(json: &Value) -> Result<Vec<ColumnInfo>, HostError> {
    let columns = json["columnModel"]["columns"].clone();
    serde_json::from_value(columns).map_err(|e| HostError::Parse(format!("column model: {}", e)))
}

/// Most recent entry of `past`, or the origin for a fresh project.
pub(crate) fn parse_latest_checkpoint(json: &Value) -> Result<Checkpoint, HostError> {
    let past = json["past"]
        .as_array()
        .ok_or_else(|| HostError::Parse("missing past in history".into()))?;
    match past.last() {
        None => Ok(Checkpoint::ORIGIN),
        Some(entry) => entry["id"]
            .as_i64()
            .map(Checkpoint)
            .ok_or_else(|| HostError::Parse("history entry without id".into())),
    }
}

/// `{"code": "error", "message": ...}` bodies are command failures even
/// with a 200 status.
pub(crate) fn check_command(json: &Value) -> Result<(), HostError> {
    if json["code"].as_str() == Some("error") {
        let message = json["message"].as_str().unwrap_or("unknown error");
        return Err(HostError::Command(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_engine_has_unselected_facet() {
        let engine: Value = serde_json::from_str(&grouping_engine("Postcode", "value.length()")).unwrap();
        assert_eq!(engine["mode"], "row-based");
        assert_eq!(engine["facets"][0]["columnName"], "Postcode");
        assert_eq!(engine["facets"][0]["expression"], "value.length()");
        assert_eq!(engine["facets"][0]["selection"], json!([]));
    }

    #[test]
    fn filter_engine_selects_error_choice() {
        let engine: Value =
            serde_json::from_str(&filter_engine(&[RowFilter::flagged("Postcode", "expr")])).unwrap();
        assert_eq!(engine["facets"][0]["selection"][0]["v"]["v"], "error");
        assert_eq!(engine["facets"][0]["selection"][0]["v"]["l"], "error");
        let empty: Value = serde_json::from_str(&filter_engine(&[])).unwrap();
        assert_eq!(empty["facets"], json!([]));
    }

    #[test]
    fn value_counts_from_matching_facet() {
        let body = json!({
            "facets": [
                { "columnName": "Other", "choices": [] },
                { "columnName": "Postcode", "choices": [
                    { "v": { "v": "postcode", "l": "postcode" }, "c": 85, "s": false },
                    { "v": { "v": "error", "l": "error" }, "c": 15, "s": false },
                ] },
            ]
        });
        let counts = parse_value_counts(&body, "Postcode").unwrap();
        assert_eq!(counts.iter().collect::<Vec<_>>(), vec![("postcode", 85), ("error", 15)]);
    }

    #[test]
    fn facet_error_is_command_failure() {
        let body = json!({ "facets": [{ "columnName": "Postcode", "error": "Parsing error" }] });
        assert_eq!(
            parse_value_counts(&body, "Postcode"),
            Err(HostError::Command("Parsing error".into()))
        );
        assert!(matches!(parse_value_counts(&json!({ "facets": [] }), "Postcode"), Err(HostError::Parse(_))));
    }

    #[test]
    fn rows_render_cell_values() {
        let body = json!({ "rows": [
            { "i": 4, "cells": [{ "v": "Ken" }, { "v": "n/a" }] },
            { "i": 9, "cells": [{ "v": "Ann" }, null] },
            { "i": 12, "cells": [{ "v": "Bo" }, { "v": 42 }] },
        ] });
        let cells = parse_rows(&body, 1).unwrap();
        assert_eq!(
            cells,
            vec![
                FlaggedCell { row: 4, value: "n/a".into() },
                FlaggedCell { row: 9, value: String::new() },
                FlaggedCell { row: 12, value: "42".into() },
            ]
        );
    }

    #[test]
    fn latest_checkpoint_from_history() {
        assert_eq!(parse_latest_checkpoint(&json!({ "past": [], "future": [] })), Ok(Checkpoint::ORIGIN));
        let history = json!({ "past": [{ "id": 1700000000001i64 }, { "id": 1700000000002i64 }] });
        assert_eq!(parse_latest_checkpoint(&history), Ok(Checkpoint(1700000000002)));
    }

    #[test]
    fn columns_from_model() {
        let body = json!({ "columnModel": { "columns": [
            { "name": "Name", "cellIndex": 0, "originalName": "Name" },
            { "name": "Postcode", "cellIndex": 3, "originalName": "Postcode" },
        ] } });
        let columns = parse_columns(&body).unwrap();
        assert_eq!(columns[1], ColumnInfo { name: "Postcode".into(), cell_index: 3 });
    }

    #[test]
    fn error_code_is_command_failure() {
        assert!(check_command(&json!({ "code": "ok" })).is_ok());
        assert_eq!(
            check_command(&json!({ "code": "error", "message": "No such project" })),
            Err(HostError::Command("No such project".into()))
        );
    }
}
