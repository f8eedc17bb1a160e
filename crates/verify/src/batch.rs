//! Batch verification of every column a wizard touched.

use colcheck_core::{HostError, TableHost, Verdict, VerificationRequest, WizardColumn};

use crate::classify::classify;
use crate::finalize::finalize;
use crate::session::{Alert, CorrectionSession, QueueEntry, SessionOptions};
use crate::verdict::evaluate;
use crate::wizard::Wizard;

/// Outcome of checking one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCheck {
    pub request: VerificationRequest,
    pub outcome: Result<Verdict, HostError>,
}

impl ColumnCheck {
    pub fn needs_attention(&self) -> bool {
        !matches!(&self.outcome, Ok(v) if v.success)
    }
}

/// Classify and evaluate one column. The row count is read now, never cached.
pub fn check_column(host: &mut dyn TableHost, request: &VerificationRequest) -> Result<Verdict, HostError> {
    let classification = classify(host, request)?;
    let total_rows = host.row_count()?;
    Ok(evaluate(
        &classification,
        &request.expected_type,
        total_rows,
        &request.column_name,
        &request.example_value,
        &request.transform_expression,
    ))
}

/// Check every column that carries verification parameters, in order.
/// A failing column does not stop the ones after it.
pub fn check_columns(host: &mut dyn TableHost, columns: &[WizardColumn]) -> Vec<ColumnCheck> {
    columns
        .iter()
        .filter_map(|column| column.verification.as_ref())
        .map(|request| ColumnCheck {
            request: request.clone(),
            outcome: check_column(host, request),
        })
        .collect()
}

pub enum Verification<'a> {
    /// Nothing to correct; the wizard's completion callback has run.
    AllClear,
    /// At least one column needs the user.
    NeedsAttention(CorrectionSession<'a>),
}

impl std::fmt::Debug for Verification<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllClear => write!(f, "AllClear"),
            Self::NeedsAttention(session) => f
                .debug_tuple("NeedsAttention")
                .field(&session.state())
                .finish(),
        }
    }
}

/// Verify a wizard's columns and decide whether the user is needed.
///
/// With no failing column the finalizer runs here and the wizard completes
/// straight away. Otherwise the returned session owns the host and the
/// wizard until it reaches `Done` or `Reverted`.
pub fn run_verification<'a>(
    host: &'a mut dyn TableHost,
    wizard: &'a mut dyn Wizard,
    columns: &[WizardColumn],
    options: SessionOptions,
) -> Verification<'a> {
    let checks = check_columns(host, columns);
    log::info!("wizard '{}': {} column(s) checked", wizard.name(), checks.len());

    let mut queue = Vec::new();
    let mut alerts = Vec::new();
    for check in checks {
        match check.outcome {
            Ok(verdict) if verdict.success => {
                log::debug!("'{}' is clear", verdict.column_name);
            }
            Ok(verdict) => queue.push(QueueEntry::new(check.request, Some(verdict))),
            Err(e) => {
                alerts.push(Alert::new(
                    &check.request.column_name,
                    format!("verification query failed: {}", e),
                ));
                queue.push(QueueEntry::new(check.request, None));
            }
        }
    }

    if queue.is_empty() {
        finalize(host, wizard, None);
        return Verification::AllClear;
    }

    Verification::NeedsAttention(CorrectionSession::new(host, wizard, queue, alerts, options))
}
