use std::collections::BTreeMap;

use crate::model::{AvailabilityStats, ComparisonRow, Discrepancy, ReportSummary};

/// Compute summary counts for a lookup report.
///
/// `labels` are provider display names in slot order; they name the
/// single-provider statuses in `by_status`.
pub fn compute_summary(
    rows: &[ComparisonRow],
    statistics: &AvailabilityStats,
    discrepancies: &[Discrepancy],
    labels: &[&str],
) -> ReportSummary {
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    for d in discrepancies {
        *by_status.entry(d.status.label(labels)).or_insert(0) += 1;
    }

    ReportSummary {
        fields: rows.len(),
        fields_with_data: rows.iter().filter(|r| r.has_data()).count(),
        discrepancies: discrepancies.len(),
        by_status,
        not_found: statistics.not_found().into_iter().map(str::to_string).collect(),
    }
}
