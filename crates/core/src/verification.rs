use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Parameters a wizard hands over for one column it has just typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub column_name: String,
    /// Per-row transform evaluated by the host. Yields the error sentinel
    /// for values that do not parse as the expected type.
    pub transform_expression: String,
    pub expected_type: String,
    /// Shown to the user while correcting values.
    pub example_value: String,
}

impl VerificationRequest {
    pub fn new(
        column_name: impl Into<String>,
        transform_expression: impl Into<String>,
        expected_type: impl Into<String>,
        example_value: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            transform_expression: transform_expression.into(),
            expected_type: expected_type.into(),
            example_value: example_value.into(),
        }
    }
}

/// A column touched by a wizard. Columns without verification parameters
/// are trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardColumn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationRequest>,
}

impl WizardColumn {
    pub fn trusted(name: impl Into<String>) -> Self {
        Self { name: name.into(), verification: None }
    }

    pub fn verified(request: VerificationRequest) -> Self {
        Self { name: request.column_name.clone(), verification: Some(request) }
    }
}

/// Row counts per distinct transformed value, in the order the host
/// returned them. Order matters: it decides ties for the dominant bucket.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, usize)>", into = "Vec<(String, usize)>")]
pub struct ValueCounts {
    buckets: Vec<(String, usize)>,
    /// Label -> position in `buckets`.
    index: FxHashMap<String, usize>,
}

impl ValueCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add rows to a bucket. A new label is appended; an existing one is
    /// incremented in place.
    pub fn add(&mut self, label: &str, count: usize) {
        match self.index.get(label) {
            Some(&i) => self.buckets[i].1 += count,
            None => {
                self.index.insert(label.to_string(), self.buckets.len());
                self.buckets.push((label.to_string(), count));
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.index.get(label).map(|&i| self.buckets[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.buckets.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Sum over all buckets.
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, c)| c).sum()
    }
}

impl fmt::Debug for ValueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for ValueCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = ValueCounts::new();
        for (label, count) in iter {
            counts.add(&label.into(), count);
        }
        counts
    }
}

impl From<Vec<(String, usize)>> for ValueCounts {
    fn from(buckets: Vec<(String, usize)>) -> Self {
        buckets.into_iter().collect()
    }
}

impl From<ValueCounts> for Vec<(String, usize)> {
    fn from(counts: ValueCounts) -> Self {
        counts.buckets
    }
}

/// Reduction of a `ValueCounts` for one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Label of the most frequent bucket ("" when the column is empty).
    pub dominant_type: String,
    pub dominant_type_count: usize,
    /// Rows whose transformed value is the error sentinel.
    pub error_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Fail,
    Unclear,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Fail => write!(f, "fail"),
            Self::Unclear => write!(f, "unclear"),
        }
    }
}

/// Which threshold rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    /// Every row is the expected type.
    Clean,
    /// No row hit the error sentinel.
    NoErrors,
    /// Every row is the same type, just not the expected one.
    UniformWrongType,
    /// The expected type covers at least 90% of rows.
    MostlyExpected,
    /// The expected type dominates, below 90%.
    SomeExpected,
    /// An unexpected type covers at least 90% of rows.
    MostlyUnexpected,
    Unclear,
}

impl VerdictReason {
    pub fn severity(self) -> Severity {
        match self {
            Self::Clean | Self::NoErrors => Severity::Success,
            Self::UniformWrongType => Severity::Fail,
            Self::MostlyExpected | Self::SomeExpected | Self::MostlyUnexpected => Severity::Warning,
            Self::Unclear => Severity::Unclear,
        }
    }

    pub fn is_success(self) -> bool {
        self.severity() == Severity::Success
    }
}

/// Outcome of comparing a column's value distribution with its expected type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub column_name: String,
    pub example_value: String,
    pub expression: String,
    pub expected_type: String,
    pub dominant_type: String,
    pub dominant_type_count: usize,
    pub error_count: usize,
    /// Row count the thresholds were computed against.
    pub total_rows: usize,
    pub message: String,
    pub success: bool,
    pub severity: Severity,
    pub reason: VerdictReason,
}

impl Verdict {
    /// Every value has the same type and it is not the expected one.
    pub fn is_wrong_column(&self) -> bool {
        self.dominant_type_count == self.total_rows && !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_counts_keep_host_order() {
        let counts: ValueCounts = vec![("postcode", 3), ("error", 2), ("number", 3)]
            .into_iter()
            .collect();
        let labels: Vec<&str> = counts.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["postcode", "error", "number"]);
        assert_eq!(counts.total(), 8);
        assert_eq!(counts.get("error"), Some(2));
        assert_eq!(counts.get("date"), None);
    }

    #[test]
    fn value_counts_merge_repeated_labels() {
        let mut counts = ValueCounts::new();
        counts.add("date", 2);
        counts.add("error", 1);
        counts.add("date", 4);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.get("date"), Some(6));
    }

    #[test]
    fn value_counts_with_many_distinct_labels() {
        let counts: ValueCounts = (0..50_000).map(|i| (format!("id-{}", i), 1)).collect();
        assert_eq!(counts.len(), 50_000);
        assert_eq!(counts.total(), 50_000);
        assert_eq!(counts.get("id-49999"), Some(1));
        assert_eq!(counts.iter().next(), Some(("id-0", 1)));
    }

    #[test]
    fn value_counts_serialize_as_ordered_pairs() {
        let counts: ValueCounts = vec![("number", 3), ("error", 1)].into_iter().collect();
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json, serde_json::json!([["number", 3], ["error", 1]]));
        let back: ValueCounts = serde_json::from_value(json).unwrap();
        assert_eq!(back, counts);
        assert_eq!(back.get("error"), Some(1));
    }

    #[test]
    fn reason_maps_to_severity() {
        assert_eq!(VerdictReason::Clean.severity(), Severity::Success);
        assert_eq!(VerdictReason::NoErrors.severity(), Severity::Success);
        assert_eq!(VerdictReason::UniformWrongType.severity(), Severity::Fail);
        assert_eq!(VerdictReason::SomeExpected.severity(), Severity::Warning);
        assert_eq!(VerdictReason::Unclear.severity(), Severity::Unclear);
        assert!(!VerdictReason::MostlyExpected.is_success());
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Unclear).unwrap();
        assert_eq!(json, "\"unclear\"");
        let reason = serde_json::to_string(&VerdictReason::UniformWrongType).unwrap();
        assert_eq!(reason, "\"uniform_wrong_type\"");
    }

    #[test]
    fn wizard_column_without_verification_omits_field() {
        let json = serde_json::to_value(WizardColumn::trusted("Street")).unwrap();
        assert_eq!(json["name"], "Street");
        assert!(json.get("verification").is_none());
    }
}
