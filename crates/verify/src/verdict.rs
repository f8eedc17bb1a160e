//! Verdict evaluation.
//!
//! Rules are checked in order and the first match wins:
//!
//! | # | condition                                  | reason             |
//! |---|--------------------------------------------|--------------------|
//! | 1 | dominant covers every row, is expected     | `Clean`            |
//! | 2 | dominant covers every row, not expected    | `UniformWrongType` |
//! | 3 | no error rows                              | `NoErrors`         |
//! | 4 | dominant >= 90%, is expected               | `MostlyExpected`   |
//! | 5 | dominant is expected                       | `SomeExpected`     |
//! | 6 | dominant >= 90%                            | `MostlyUnexpected` |
//! | 7 | otherwise                                  | `Unclear`          |
//!
//! Rule 2 comes before rule 3: a column whose rows all share one unexpected
//! type has no error rows, yet still fails. "No error rows means success"
//! therefore holds only when the rows are not uniformly of a wrong type.

use colcheck_core::{ClassificationResult, Verdict, VerdictReason};

use crate::message::verdict_message;

/// Share of rows the dominant bucket must cover to count as "mostly".
pub const PERCENTAGE: f64 = 0.9;

/// `count >= 0.9 * total`, computed exactly in integers.
fn reaches_threshold(count: usize, total: usize) -> bool {
    (count as u128) * 10 >= (total as u128) * 9
}

pub fn reason_for(classification: &ClassificationResult, expected_type: &str, total_rows: usize) -> VerdictReason {
    let dominant = classification.dominant_type_count;
    let expected = classification.dominant_type == expected_type;
    let covers_all = total_rows > 0 && dominant == total_rows;
    let mostly = reaches_threshold(dominant, total_rows);

    if covers_all && expected {
        VerdictReason::Clean
    } else if covers_all {
        VerdictReason::UniformWrongType
    } else if classification.error_count == 0 {
        VerdictReason::NoErrors
    } else if mostly && expected {
        VerdictReason::MostlyExpected
    } else if expected {
        VerdictReason::SomeExpected
    } else if mostly {
        VerdictReason::MostlyUnexpected
    } else {
        VerdictReason::Unclear
    }
}

/// Compare a classification with the expected type. Pure: the same inputs
/// always give the same verdict.
pub fn evaluate(
    classification: &ClassificationResult,
    expected_type: &str,
    total_rows: usize,
    column_name: &str,
    example_value: &str,
    expression: &str,
) -> Verdict {
    let reason = reason_for(classification, expected_type, total_rows);
    Verdict {
        column_name: column_name.to_string(),
        example_value: example_value.to_string(),
        expression: expression.to_string(),
        expected_type: expected_type.to_string(),
        dominant_type: classification.dominant_type.clone(),
        dominant_type_count: classification.dominant_type_count,
        error_count: classification.error_count,
        total_rows,
        message: verdict_message(reason, column_name, &classification.dominant_type),
        success: reason.is_success(),
        severity: reason.severity(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colcheck_core::Severity;

    fn result(dominant: &str, count: usize, errors: usize) -> ClassificationResult {
        ClassificationResult {
            dominant_type: dominant.to_string(),
            dominant_type_count: count,
            error_count: errors,
        }
    }

    fn eval(c: &ClassificationResult, expected: &str, total: usize) -> Verdict {
        evaluate(c, expected, total, "Postcode", "SW1A 1AA", "postcode ~ /./")
    }

    #[test]
    fn clean_column() {
        let v = eval(&result("postcode", 100, 0), "postcode", 100);
        assert!(v.success);
        assert_eq!(v.severity, Severity::Success);
        assert_eq!(v.reason, VerdictReason::Clean);
        assert_eq!(v.message, "All values in the Postcode column successfully typed as postcode.");
    }

    #[test]
    fn expected_type_with_some_errors() {
        let v = eval(&result("postcode", 85, 15), "postcode", 100);
        assert!(!v.success);
        assert_eq!(v.severity, Severity::Warning);
        assert_eq!(v.reason, VerdictReason::SomeExpected);
        assert!(v.message.contains("contains values that were expected, but there are some unexpected"));
        assert!(!v.message.contains("At least 90%"));
    }

    #[test]
    fn uniform_wrong_type_fails() {
        let v = eval(&result("number", 50, 0), "date", 50);
        assert!(!v.success);
        assert_eq!(v.severity, Severity::Fail);
        assert_eq!(v.reason, VerdictReason::UniformWrongType);
        assert!(v.message.contains("despite every value being the same type"));
        assert!(v.is_wrong_column());

        let v = eval(&result("error", 50, 50), "date", 50);
        assert_eq!(v.reason, VerdictReason::UniformWrongType);
    }

    #[test]
    fn no_errors_with_mixed_types_is_success() {
        let v = eval(&result("number", 30, 0), "date", 50);
        assert!(v.success);
        assert_eq!(v.reason, VerdictReason::NoErrors);
        assert_eq!(v.message, "All values in the Postcode column successfully typed as number.");
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        let v = eval(&result("postcode", 90, 10), "postcode", 100);
        assert_eq!(v.reason, VerdictReason::MostlyExpected);
        assert_eq!(v.message, "At least 90% of the Postcode column's values are of the expected type postcode.");

        let v = eval(&result("postcode", 89, 11), "postcode", 100);
        assert_eq!(v.reason, VerdictReason::SomeExpected);
    }

    #[test]
    fn unexpected_dominant_type() {
        let v = eval(&result("number", 95, 5), "postcode", 100);
        assert_eq!(v.reason, VerdictReason::MostlyUnexpected);
        assert_eq!(v.message, "The Postcode column mostly contains values of the type number - which was not expected.");

        let v = eval(&result("number", 40, 35), "postcode", 100);
        assert_eq!(v.reason, VerdictReason::Unclear);
        assert_eq!(v.severity, Severity::Unclear);
    }

    #[test]
    fn empty_column_is_success() {
        let v = eval(&ClassificationResult::default(), "postcode", 0);
        assert!(v.success);
    }

    #[test]
    fn percentage_constant_matches_threshold() {
        assert!(reaches_threshold(9, 10));
        assert!(!reaches_threshold(8, 10));
        assert_eq!(PERCENTAGE, 0.9);
    }
}
