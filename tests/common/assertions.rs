//! Helpers for inspecting execution logs in tests.

use package_prober::engine::{ExecutionLogSink, InvocationRecord, Outcome};

/// All invocation records for `member`, in log order.
pub fn records_named<'a>(sink: &'a ExecutionLogSink, member: &str) -> Vec<&'a InvocationRecord> {
    sink.log()
        .records()
        .filter(|r| r.member == member)
        .collect()
}

/// Outcome of the single invocation of `member`.
///
/// # Panics
///
/// Panics unless `member` was invoked exactly once.
pub fn outcome_of(sink: &ExecutionLogSink, member: &str) -> Outcome {
    let records = records_named(sink, member);
    assert_eq!(
        records.len(),
        1,
        "expected exactly one invocation of {member}, got {}",
        records.len()
    );
    records[0].outcome.clone()
}

/// The text rendering of the log, one entry per line.
pub fn text_lines(sink: &ExecutionLogSink) -> Vec<String> {
    sink.log().to_text().lines().map(str::to_string).collect()
}
