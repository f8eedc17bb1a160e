//! Correction session
//!
//! Index-driven state machine over the columns that failed verification.
//! Each public action runs to completion, host calls included, before it
//! returns; the next action can only be taken afterwards.
//!
//! ```text
//! Presenting(i) --inspect--> Inspecting(i) --fix--> Editing(i) --+--> Presenting(i)
//!      |  ^                       |                              +--> next / Done
//!      |  +--retry (unavailable)  +--done--> next / Done
//!      +--accept--> next / Done
//!      +--undo--> Reverted
//! ```
//!
//! Invariants:
//! - A row filter exists only in `Inspecting`/`Editing`
//! - The filter is released before the session advances, finishes or reverts
//! - `Done` and `Reverted` are terminal; the completion callback fires once

use std::fmt;

use serde::Serialize;

use colcheck_core::{CellEdit, FlaggedCell, HostError, RowFilter, TableHost, Verdict, VerificationRequest};

use crate::batch::check_column;
use crate::error::SessionError;
use crate::finalize::finalize;
use crate::message::{display_limit_note, Prompt, RERUN_TIP};
use crate::wizard::{Chrome, Wizard};

pub const DEFAULT_DISPLAY_LIMIT: usize = 10;
pub const DEFAULT_CORRECTION_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Flagged rows fetched per Inspect.
    pub display_limit: usize,
    /// Up to this many errors the prompt asks for fixes one by one.
    pub correction_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
            correction_limit: DEFAULT_CORRECTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum SessionState {
    Presenting(usize),
    Inspecting(usize),
    Editing(usize),
    Done,
    Reverted,
}

impl SessionState {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Presenting(i) | Self::Inspecting(i) | Self::Editing(i) => Some(i),
            Self::Done | Self::Reverted => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Reverted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presenting(i) => write!(f, "presenting column {}", i + 1),
            Self::Inspecting(i) => write!(f, "inspecting column {}", i + 1),
            Self::Editing(i) => write!(f, "editing column {}", i + 1),
            Self::Done => write!(f, "done"),
            Self::Reverted => write!(f, "reverted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Undo,
    Inspect,
    Accept,
    Retry,
    Fix,
    Done,
}

impl Action {
    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            Self::Undo => "Undo",
            Self::Inspect => "Let me see",
            Self::Accept => "Carry on",
            Self::Retry => "Retry",
            Self::Fix => "Fix",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undo => "undo",
            Self::Inspect => "inspect",
            Self::Accept => "accept",
            Self::Retry => "retry",
            Self::Fix => "fix",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// A host failure the user has to be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub column: String,
    pub message: String,
}

impl Alert {
    pub fn new(column: &str, message: String) -> Self {
        log::warn!("{}: {}", column, message);
        Self { column: column.to_string(), message }
    }
}

/// A column that failed verification. `verdict` is `None` when the host
/// could not classify it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub request: VerificationRequest,
    pub verdict: Option<Verdict>,
    pub resolved: bool,
    /// The wizard re-run after the last Fix failed; Retry repeats it.
    pub rerun_pending: bool,
}

impl QueueEntry {
    pub fn new(request: VerificationRequest, verdict: Option<Verdict>) -> Self {
        Self { request, verdict, resolved: false, rerun_pending: false }
    }

    fn inspectable(&self) -> bool {
        matches!(&self.verdict, Some(v) if !v.is_wrong_column())
    }
}

/// What the user should be looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Presenting {
        index: usize,
        verdict: Option<Verdict>,
        prompt: Prompt,
        actions: Vec<Action>,
    },
    Inspecting {
        index: usize,
        column: String,
        example_value: String,
        cells: Vec<FlaggedCell>,
        note: String,
        tip: Option<String>,
        actions: Vec<Action>,
    },
    Editing {
        index: usize,
    },
    Done,
    Reverted,
}

pub struct CorrectionSession<'a> {
    host: &'a mut dyn TableHost,
    wizard: &'a mut dyn Wizard,
    queue: Vec<QueueEntry>,
    state: SessionState,
    options: SessionOptions,
    /// Set once the user has fixed values for the current column.
    has_pending_edit: bool,
    /// Column carrying this session's row filter.
    active_filter: Option<String>,
    flagged: Vec<FlaggedCell>,
    alerts: Vec<Alert>,
}

impl<'a> CorrectionSession<'a> {
    /// Start at the first queued column. `queue` must not be empty.
    pub(crate) fn new(
        host: &'a mut dyn TableHost,
        wizard: &'a mut dyn Wizard,
        queue: Vec<QueueEntry>,
        alerts: Vec<Alert>,
        options: SessionOptions,
    ) -> Self {
        wizard.set_chrome(Chrome::Verification);
        log::info!(
            "wizard '{}': {} column(s) need attention",
            wizard.name(),
            queue.len()
        );
        Self {
            host,
            wizard,
            queue,
            state: SessionState::Presenting(0),
            options,
            has_pending_edit: false,
            active_filter: None,
            flagged: Vec::new(),
            alerts,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn queue(&self) -> &[QueueEntry] {
        &self.queue
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn has_pending_edit(&self) -> bool {
        self.has_pending_edit
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.active_filter.as_deref()
    }

    /// Cells shown by the last Inspect.
    pub fn flagged(&self) -> &[FlaggedCell] {
        &self.flagged
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Drain pending alerts for display.
    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        match self.state {
            SessionState::Presenting(i) => {
                let entry = &self.queue[i];
                let mut actions = vec![Action::Undo];
                if entry.inspectable() {
                    actions.push(Action::Inspect);
                }
                actions.push(Action::Accept);
                if entry.verdict.is_none() {
                    actions.push(Action::Retry);
                }
                actions
            }
            SessionState::Inspecting(_) => vec![Action::Undo, Action::Fix, Action::Done],
            SessionState::Editing(_) | SessionState::Done | SessionState::Reverted => Vec::new(),
        }
    }

    pub fn view(&self) -> View {
        match self.state {
            SessionState::Presenting(index) => {
                let entry = &self.queue[index];
                View::Presenting {
                    index,
                    verdict: entry.verdict.clone(),
                    prompt: Prompt::new(&entry.request, entry.verdict.as_ref(), self.options.correction_limit),
                    actions: self.available_actions(),
                }
            }
            SessionState::Inspecting(index) => {
                let request = &self.queue[index].request;
                View::Inspecting {
                    index,
                    column: request.column_name.clone(),
                    example_value: request.example_value.clone(),
                    cells: self.flagged.clone(),
                    note: display_limit_note(self.options.display_limit),
                    tip: self.has_pending_edit.then(|| RERUN_TIP.to_string()),
                    actions: self.available_actions(),
                }
            }
            SessionState::Editing(index) => View::Editing { index },
            SessionState::Done => View::Done,
            SessionState::Reverted => View::Reverted,
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    /// Roll the host back to the wizard's checkpoint and drop every queued
    /// column. If the host refuses, an alert is raised and nothing changes.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        let i = self.require(Action::Undo)?;
        let checkpoint = self.wizard.checkpoint();
        if let Err(e) = self.host.undo_to(checkpoint) {
            self.alert(i, format!("undo to {} failed: {}", checkpoint, e));
            return Ok(());
        }

        if let Some(column) = self.active_filter.take() {
            if let Err(e) = self.host.remove_row_filter(&column) {
                log::warn!("could not remove row filter on '{}': {}", column, e);
            }
        }
        self.flagged.clear();
        self.queue.clear();
        self.has_pending_edit = false;
        self.wizard.set_chrome(Chrome::Default);
        self.wizard.reverted();
        self.state = SessionState::Reverted;
        log::info!("wizard '{}' reverted to {}", self.wizard.name(), checkpoint);
        Ok(())
    }

    /// Filter the table down to the flagged rows of the current column and
    /// fetch the first `display_limit` of them.
    pub fn inspect(&mut self) -> Result<(), SessionError> {
        let i = self.require(Action::Inspect)?;
        let request = &self.queue[i].request;
        let filter = RowFilter::flagged(&request.column_name, &request.transform_expression);
        let column = request.column_name.clone();

        if let Err(e) = self.host.add_row_filter(&filter) {
            self.alert(i, format!("could not filter rows: {}", e));
            return Ok(());
        }
        self.active_filter = Some(column.clone());

        match self.host.flagged_cells(&column, self.options.display_limit) {
            Ok(cells) => {
                log::info!("'{}': showing {} flagged row(s)", column, cells.len());
                self.flagged = cells;
                self.state = SessionState::Inspecting(i);
            }
            Err(e) => {
                self.alert(i, format!("could not fetch flagged rows: {}", e));
                if let Err(e) = self.release_filter() {
                    // The filter is still on, so stay with an empty list.
                    log::warn!("could not remove row filter on '{}': {}", column, e);
                    self.flagged.clear();
                    self.state = SessionState::Inspecting(i);
                }
            }
        }
        Ok(())
    }

    /// Leave the current column as it is and move on.
    pub fn accept(&mut self) -> Result<(), SessionError> {
        let i = self.require(Action::Accept)?;
        self.resolve_and_advance(i);
        Ok(())
    }

    /// Re-classify a column whose verification query failed, re-running
    /// the wizard first if that is what failed.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        let i = self.require(Action::Retry)?;
        if self.queue[i].rerun_pending && !self.rerun(i) {
            return Ok(());
        }
        self.recheck(i);
        Ok(())
    }

    /// Apply the user's corrections one cell at a time, then re-run the
    /// wizard and re-verify the column. Edits that leave the shown value
    /// unchanged are not sent.
    pub fn fix(&mut self, edits: Vec<CellEdit>) -> Result<(), SessionError> {
        let i = self.require(Action::Fix)?;
        self.state = SessionState::Editing(i);

        let mut issued = 0;
        for edit in &edits {
            let unchanged = self
                .flagged
                .iter()
                .any(|cell| cell.row == edit.row && cell.value == edit.value);
            if unchanged {
                continue;
            }
            if let Err(e) = self.host.edit_cell(edit) {
                self.alert(i, format!("could not edit row {}: {}", edit.row + 1, e));
                self.has_pending_edit |= issued > 0;
                self.back_to_inspecting(i);
                return Ok(());
            }
            issued += 1;
        }
        log::info!("'{}': {} cell(s) edited", self.queue[i].request.column_name, issued);
        self.has_pending_edit = true;

        if let Err(e) = self.release_filter() {
            self.alert(i, format!("could not remove row filter: {}", e));
            self.back_to_inspecting(i);
            return Ok(());
        }

        if !self.rerun(i) {
            return Ok(());
        }
        self.recheck(i);
        Ok(())
    }

    /// Stop correcting the current column and move on.
    pub fn done(&mut self) -> Result<(), SessionError> {
        let i = self.require(Action::Done)?;
        self.resolve_and_advance(i);
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require(&self, action: Action) -> Result<usize, SessionError> {
        match self.state.index() {
            Some(i) if self.available_actions().contains(&action) => Ok(i),
            _ => Err(SessionError::ActionNotAvailable { action, state: self.state }),
        }
    }

    fn alert(&mut self, index: usize, message: String) {
        let alert = Alert::new(&self.queue[index].request.column_name, message);
        self.alerts.push(alert);
    }

    fn release_filter(&mut self) -> Result<(), HostError> {
        if let Some(column) = self.active_filter.take() {
            if let Err(e) = self.host.remove_row_filter(&column) {
                self.active_filter = Some(column);
                return Err(e);
            }
        }
        self.flagged.clear();
        Ok(())
    }

    /// Return to the flagged-row list after a failed edit, refreshing it so
    /// rows fixed so far drop out.
    fn back_to_inspecting(&mut self, i: usize) {
        if self.active_filter.is_some() {
            let column = self.queue[i].request.column_name.clone();
            match self.host.flagged_cells(&column, self.options.display_limit) {
                Ok(cells) => self.flagged = cells,
                Err(e) => log::warn!("could not refresh flagged rows of '{}': {}", column, e),
            }
        }
        self.state = SessionState::Inspecting(i);
    }

    /// Re-run the wizard's transform. On failure the column is left
    /// unverified in `Presenting(i)` with the re-run still pending.
    fn rerun(&mut self, i: usize) -> bool {
        match self.wizard.rerun(&mut *self.host) {
            Ok(()) => {
                self.queue[i].rerun_pending = false;
                true
            }
            Err(e) => {
                self.alert(i, format!("re-running wizard '{}' failed: {}", self.wizard.name(), e));
                self.queue[i].rerun_pending = true;
                self.queue[i].verdict = None;
                self.state = SessionState::Presenting(i);
                false
            }
        }
    }

    fn recheck(&mut self, i: usize) {
        match check_column(&mut *self.host, &self.queue[i].request) {
            Ok(verdict) if verdict.success => {
                log::info!("'{}' now verifies: {}", verdict.column_name, verdict.message);
                self.queue[i].verdict = Some(verdict);
                self.queue[i].resolved = true;
                self.advance_from(i);
            }
            Ok(verdict) => {
                log::info!("'{}' still has unexpected values: {}", verdict.column_name, verdict.message);
                self.queue[i].verdict = Some(verdict);
                self.state = SessionState::Presenting(i);
            }
            Err(e) => {
                self.alert(i, format!("verification query failed: {}", e));
                self.queue[i].verdict = None;
                self.state = SessionState::Presenting(i);
            }
        }
    }

    fn resolve_and_advance(&mut self, i: usize) {
        if let Err(e) = self.release_filter() {
            self.alert(i, format!("could not remove row filter: {}", e));
            return;
        }
        self.queue[i].resolved = true;
        self.advance_from(i);
    }

    fn advance_from(&mut self, i: usize) {
        self.has_pending_edit = false;
        match (i + 1..self.queue.len()).find(|&j| !self.queue[j].resolved) {
            Some(next) => {
                log::info!("moving on to '{}'", self.queue[next].request.column_name);
                self.state = SessionState::Presenting(next);
            }
            None => self.finish(),
        }
    }

    fn finish(&mut self) {
        let lingering = self.active_filter.take();
        finalize(&mut *self.host, &mut *self.wizard, lingering.as_deref());
        self.flagged.clear();
        self.state = SessionState::Done;
    }
}

impl fmt::Debug for CorrectionSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrectionSession")
            .field("wizard", &self.wizard.name())
            .field("state", &self.state)
            .field("queue", &self.queue)
            .field("has_pending_edit", &self.has_pending_edit)
            .field("active_filter", &self.active_filter)
            .finish_non_exhaustive()
    }
}
