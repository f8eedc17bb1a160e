// `verify --check` report: one line per verified column, or JSON.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;

use colcheck_core::Verdict;
use colcheck_verify::ColumnCheck;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Attention,
    Unavailable,
}

#[derive(Debug, Serialize)]
pub struct ColumnReport {
    pub column: String,
    pub expected_type: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub wizard: String,
    pub run_at: DateTime<Utc>,
    pub columns: Vec<ColumnReport>,
    pub needs_attention: usize,
    pub unavailable: usize,
}

impl CheckReport {
    pub fn new(wizard: &str, checks: Vec<ColumnCheck>) -> Self {
        let columns: Vec<ColumnReport> = checks
            .into_iter()
            .map(|check| {
                let column = check.request.column_name;
                let expected_type = check.request.expected_type;
                match check.outcome {
                    Ok(verdict) => ColumnReport {
                        column,
                        expected_type,
                        status: if verdict.success { Status::Ok } else { Status::Attention },
                        verdict: Some(verdict),
                        error: None,
                    },
                    Err(e) => ColumnReport {
                        column,
                        expected_type,
                        status: Status::Unavailable,
                        verdict: None,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();

        Self {
            wizard: wizard.to_string(),
            run_at: Utc::now(),
            needs_attention: columns.iter().filter(|c| c.status == Status::Attention).count(),
            unavailable: columns.iter().filter(|c| c.status == Status::Unavailable).count(),
            columns,
        }
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Wizard: {} ({} column(s) checked)", self.wizard, self.columns.len())?;
        let width = self.columns.iter().map(|c| c.column.len()).max().unwrap_or(0);
        for c in &self.columns {
            let (label, text) = match (&c.verdict, &c.error) {
                (Some(v), _) => (v.severity.to_string(), v.message.clone()),
                (None, Some(e)) => ("unavailable".to_string(), e.clone()),
                (None, None) => ("unavailable".to_string(), String::new()),
            };
            writeln!(out, "  {:<width$}  {:<11}  {}", c.column, label, text, width = width)?;
        }
        if self.needs_attention > 0 {
            writeln!(out, "{} column(s) need attention", self.needs_attention)?;
        }
        if self.unavailable > 0 {
            writeln!(out, "{} column(s) could not be verified", self.unavailable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colcheck_core::{HostError, VerificationRequest};
    use colcheck_verify::evaluate;

    fn check(column: &str, outcome: Result<Verdict, HostError>) -> ColumnCheck {
        ColumnCheck {
            request: VerificationRequest::new(column, "expr", "number", "42"),
            outcome,
        }
    }

    fn verdict(column: &str, dominant: usize, errors: usize) -> Verdict {
        let c = colcheck_core::ClassificationResult {
            dominant_type: "number".into(),
            dominant_type_count: dominant,
            error_count: errors,
        };
        evaluate(&c, "number", dominant + errors, column, "42", "expr")
    }

    #[test]
    fn counts_attention_and_unavailable() {
        let report = CheckReport::new(
            "import",
            vec![
                check("Qty", Ok(verdict("Qty", 10, 0))),
                check("Price", Ok(verdict("Price", 8, 2))),
                check("Town", Err(HostError::UnknownColumn("Town".into()))),
            ],
        );
        assert_eq!(report.needs_attention, 1);
        assert_eq!(report.unavailable, 1);
        assert_eq!(report.columns[0].status, Status::Ok);
        assert_eq!(report.columns[2].error.as_deref(), Some("unknown column 'Town'"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["columns"][1]["status"], "attention");
        assert!(json["columns"][2].get("verdict").is_none());
        assert!(json["run_at"].is_string());
    }

    #[test]
    fn text_lists_every_column() {
        let report = CheckReport::new("import", vec![check("Price", Ok(verdict("Price", 8, 2)))]);
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Wizard: import (1 column(s) checked)"));
        assert!(text.contains("Price  warning"));
        assert!(text.contains("1 column(s) need attention"));
    }
}
