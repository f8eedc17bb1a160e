//! User-facing text: verdict messages and the correction prompt.

use serde::Serialize;

use colcheck_core::{Verdict, VerdictReason, VerificationRequest};

pub const PROMPT_TITLE: &str = "Unexpected values";

pub const RERUN_TIP: &str =
    "If you have corrected all of the values properly, there should be no more rows left for you to edit.";

pub fn verdict_message(reason: VerdictReason, column: &str, dominant_type: &str) -> String {
    match reason {
        VerdictReason::Clean | VerdictReason::NoErrors => {
            format!("All values in the {} column successfully typed as {}.", column, dominant_type)
        }
        VerdictReason::UniformWrongType => format!(
            "None of the values in the {} column could be typed properly - despite every value \
             being the same type. Is this the correct column for this wizard?",
            column
        ),
        VerdictReason::MostlyExpected => format!(
            "At least 90% of the {} column's values are of the expected type {}.",
            column, dominant_type
        ),
        VerdictReason::SomeExpected => format!(
            "The {} column contains values that were expected, but there are some unexpected values too.",
            column
        ),
        VerdictReason::MostlyUnexpected => format!(
            "The {} column mostly contains values of the type {} - which was not expected.",
            column, dominant_type
        ),
        VerdictReason::Unclear => format!(
            "There's no clear value type in the {} column - but the most frequently occurring is {}.",
            column, dominant_type
        ),
    }
}

/// How the prompt frames the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Framing {
    /// Every value has the same, unexpected type.
    WrongColumn,
    /// Few enough errors to fix one by one.
    FewUnexpected { count: usize },
    ManyUnexpected { percent: u32, count: usize },
    /// Classification did not come back from the host.
    Unavailable,
}

impl Framing {
    pub fn for_verdict(verdict: &Verdict, correction_limit: usize) -> Self {
        if verdict.is_wrong_column() {
            Framing::WrongColumn
        } else if verdict.error_count <= correction_limit {
            Framing::FewUnexpected { count: verdict.error_count }
        } else {
            Framing::ManyUnexpected {
                percent: percent_of(verdict.error_count, verdict.total_rows),
                count: verdict.error_count,
            }
        }
    }
}

fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

/// Text shown while a column waits for the user's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub title: String,
    pub framing: Framing,
    pub message: String,
    pub details: String,
    pub example_value: String,
}

impl Prompt {
    pub fn new(request: &VerificationRequest, verdict: Option<&Verdict>, correction_limit: usize) -> Self {
        let column = &request.column_name;
        let framing = match verdict {
            Some(v) => Framing::for_verdict(v, correction_limit),
            None => Framing::Unavailable,
        };

        let (message, details) = match framing {
            Framing::WrongColumn => (
                format!("None of the values in the {} column could be typed properly!", column),
                "Are you sure you picked the right column?".to_string(),
            ),
            Framing::FewUnexpected { count: 1 } => (
                format!("1 unexpected value has been detected in the column {}.", column),
                "Can you fix it?".to_string(),
            ),
            Framing::FewUnexpected { count } => (
                format!("{} unexpected values have been detected in the column {}.", count, column),
                "Can you fix them?".to_string(),
            ),
            Framing::ManyUnexpected { percent, count } => (
                format!(
                    "Around {}% of the values ({}) in the {} column have been detected as unexpected values.",
                    percent, count, column
                ),
                "Are you sure you have selected the correct column?".to_string(),
            ),
            Framing::Unavailable => (
                format!("The {} column could not be verified.", column),
                "The host did not answer the verification query. Retry, carry on or undo.".to_string(),
            ),
        };

        Self {
            title: PROMPT_TITLE.to_string(),
            framing,
            message,
            details,
            example_value: request.example_value.clone(),
        }
    }

    pub fn example_line(&self) -> String {
        format!("Example value: {}", self.example_value)
    }
}

pub fn display_limit_note(limit: usize) -> String {
    format!("A maximum of {} values are shown", limit)
}
