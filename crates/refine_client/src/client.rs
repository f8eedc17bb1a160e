use std::thread;
use std::time::Duration;

use serde_json::Value;

use colcheck_core::{
    CellEdit, Checkpoint, FlaggedCell, HostError, RowFilter, TableHost, ValueCounts,
};

use crate::wire::{self, ColumnInfo};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 3;

const USER_AGENT: &str = concat!("colcheck/", env!("CARGO_PKG_VERSION"));

/// Client for one project on an OpenRefine-compatible server (blocking).
pub struct RefineClient {
    http: reqwest::blocking::Client,
    base_url: String,
    project: String,
    retries: u32,
    backoff: Duration,
    csrf_token: Option<String>,
    filters: Vec<RowFilter>,
    columns: Option<Vec<ColumnInfo>>,
}

impl RefineClient {
    pub fn new(base_url: &str, project: &str, timeout: Duration, retries: u32) -> Result<Self, HostError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| HostError::Network(format!("cannot create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.to_string(),
            retries,
            backoff: Duration::from_millis(500),
            csrf_token: None,
            filters: Vec::new(),
            columns: None,
        })
    }

    /// Delay before the first retry; doubles on each further attempt.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Filters currently sent with row queries.
    pub fn filters(&self) -> &[RowFilter] {
        &self.filters
    }

    fn url(&self, command: &str) -> String {
        format!("{}/command/core/{}", self.base_url, command)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Send with retry + exponential backoff. Transport errors and 5xx are
    /// retried; 4xx and `{"code":"error"}` bodies fail at once.
    fn request_with_retry(
        &self,
        command: &str,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<Value, HostError> {
        let mut backoff = self.backoff;

        for attempt in 0..=self.retries {
            let last = attempt == self.retries;
            match build_request(&self.http).send() {
                Err(e) => {
                    if last {
                        return Err(HostError::Network(e.to_string()));
                    }
                    log::warn!("{}: {} (retry {}/{})", command, e, attempt + 1, self.retries);
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_server_error() {
                        if last {
                            let body = resp.text().unwrap_or_default();
                            return Err(HostError::Http(status, body));
                        }
                        log::warn!("{}: HTTP {} (retry {}/{})", command, status, attempt + 1, self.retries);
                    } else if !resp.status().is_success() {
                        let body = resp.text().unwrap_or_default();
                        return Err(HostError::Http(status, body));
                    } else {
                        let text = resp
                            .text()
                            .map_err(|e| HostError::Network(format!("cannot read response body: {}", e)))?;
                        let json: Value = serde_json::from_str(&text)
                            .map_err(|e| HostError::Parse(format!("{}: {}", command, e)))?;
                        wire::check_command(&json)?;
                        log::debug!("{}: ok", command);
                        return Ok(json);
                    }
                }
            }
            thread::sleep(backoff);
            backoff *= 2;
        }

        Err(HostError::Network(format!("{}: no attempt made", command)))
    }

    fn get(&self, command: &str) -> Result<Value, HostError> {
        let url = self.url(command);
        let project = self.project.clone();
        self.request_with_retry(command, |http| http.get(&url).query(&[("project", &project)]))
    }

    fn post(&mut self, command: &str, form: &[(&str, String)]) -> Result<Value, HostError> {
        let token = self.csrf_token()?;
        let url = self.url(command);
        let project = self.project.clone();
        self.request_with_retry(command, |http| {
            http.post(&url)
                .query(&[("project", &project), ("csrf_token", &token)])
                .form(form)
        })
    }

    /// Fetched once, then reused for every POST.
    fn csrf_token(&mut self) -> Result<String, HostError> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let url = self.url("get-csrf-token");
        let json = self.request_with_retry("get-csrf-token", |http| http.get(&url))?;
        let token = json["token"]
            .as_str()
            .ok_or_else(|| HostError::Parse("missing token in response".into()))?
            .to_string();
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    // ========================================================================
    // Column model
    // ========================================================================

    fn cell_index(&mut self, column: &str) -> Result<usize, HostError> {
        if self.columns.is_none() {
            let json = self.get("get-models")?;
            self.columns = Some(wire::parse_columns(&json)?);
        }
        self.columns
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.cell_index)
            .ok_or_else(|| HostError::UnknownColumn(column.to_string()))
    }
}

impl TableHost for RefineClient {
    fn value_counts(&mut self, column: &str, expression: &str) -> Result<ValueCounts, HostError> {
        let engine = wire::grouping_engine(column, expression);
        let json = self.post("compute-facets", &[("engine", engine)])?;
        wire::parse_value_counts(&json, column)
    }

    fn row_count(&mut self) -> Result<usize, HostError> {
        let form = [
            ("engine", wire::filter_engine(&[])),
            ("start", "0".to_string()),
            ("limit", "0".to_string()),
        ];
        let json = self.post("get-rows", &form)?;
        wire::parse_total(&json)
    }

    fn edit_cell(&mut self, edit: &CellEdit) -> Result<(), HostError> {
        let cell = self.cell_index(&edit.column)?;
        let form = [
            ("row", edit.row.to_string()),
            ("cell", cell.to_string()),
            ("value", edit.value.clone()),
            ("type", "text".to_string()),
            ("engine", wire::filter_engine(&self.filters)),
        ];
        self.post("edit-one-cell", &form)?;
        Ok(())
    }

    fn add_row_filter(&mut self, filter: &RowFilter) -> Result<(), HostError> {
        self.cell_index(&filter.column)?;
        self.filters.retain(|f| f.column != filter.column);
        self.filters.push(filter.clone());
        Ok(())
    }

    fn remove_row_filter(&mut self, column: &str) -> Result<(), HostError> {
        self.filters.retain(|f| f.column != column);
        Ok(())
    }

    fn flagged_cells(&mut self, column: &str, limit: usize) -> Result<Vec<FlaggedCell>, HostError> {
        let cell = self.cell_index(column)?;
        let form = [
            ("engine", wire::filter_engine(&self.filters)),
            ("start", "0".to_string()),
            ("limit", limit.to_string()),
        ];
        let json = self.post("get-rows", &form)?;
        wire::parse_rows(&json, cell)
    }

    fn latest_checkpoint(&mut self) -> Result<Checkpoint, HostError> {
        let json = self.get("get-history")?;
        wire::parse_latest_checkpoint(&json)
    }

    fn undo_to(&mut self, checkpoint: Checkpoint) -> Result<(), HostError> {
        self.post("undo-redo", &[("lastDoneID", checkpoint.0.to_string())])?;
        // Undo may roll back column additions or renames.
        self.columns = None;
        Ok(())
    }
}
