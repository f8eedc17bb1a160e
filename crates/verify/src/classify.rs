use colcheck_core::{
    ClassificationResult, HostError, TableHost, ValueCounts, VerificationRequest, ERROR_SENTINEL,
};

/// Run the grouping query for one column and reduce it.
pub fn classify(
    host: &mut dyn TableHost,
    request: &VerificationRequest,
) -> Result<ClassificationResult, HostError> {
    let counts = host.value_counts(&request.column_name, &request.transform_expression)?;
    let result = reduce(&counts);
    log::debug!(
        "classified '{}': dominant '{}' x{}, {} error(s)",
        request.column_name,
        result.dominant_type,
        result.dominant_type_count,
        result.error_count
    );
    Ok(result)
}

/// Reduce bucket counts to the dominant bucket and the error count.
///
/// The dominant bucket is the first one to reach the maximum: a later bucket
/// with an equal count does not replace it. The error sentinel is an ordinary
/// bucket here, so a column of nothing but errors is dominated by `"error"`.
pub fn reduce(counts: &ValueCounts) -> ClassificationResult {
    let mut result = ClassificationResult::default();
    for (label, count) in counts.iter() {
        if label == ERROR_SENTINEL {
            result.error_count += count;
        }
        if count > result.dominant_type_count {
            result.dominant_type = label.to_string();
            result.dominant_type_count = count;
        }
    }
    result
}
