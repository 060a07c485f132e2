use crate::compare::build_comparison;
use crate::discrepancy::find_discrepancies;
use crate::error::ReconError;
use crate::summary::compute_summary;
use crate::model::{FlatRecord, LookupReport, ReportMeta};
use crate::schema::FieldRegistry;
use crate::stats::compute_statistics;

/// Check that the providers returned something that looks like a property.
///
/// Fails with [`ReconError::NoData`] when every record is empty, and with
/// [`ReconError::NoPropertyData`] when no record carries one of its
/// provider's marker keys.
pub fn check_property_data(registry: &FieldRegistry, records: &[FlatRecord]) -> Result<(), ReconError> {
    if records.iter().all(FlatRecord::is_empty) {
        return Err(ReconError::NoData);
    }

    let has_marker = registry
        .providers()
        .iter()
        .zip(records)
        .any(|(provider, record)| provider.markers.iter().any(|m| record.contains_key(m)));

    if !has_marker {
        return Err(ReconError::NoPropertyData);
    }
    Ok(())
}

/// Reconcile flattened provider records for one address.
///
/// `records` follow the registry's provider-slot order; a missing or empty
/// record stands for a provider that returned nothing.
pub fn reconcile(
    registry: &FieldRegistry,
    address: &str,
    records: &[FlatRecord],
) -> Result<LookupReport, ReconError> {
    check_property_data(registry, records)?;

    let comparison = build_comparison(registry, records);
    let statistics = compute_statistics(registry, records);
    let discrepancies = find_discrepancies(&comparison);

    let labels = registry.labels();
    let summary = compute_summary(&comparison, &statistics, &discrepancies, &labels);
    log::info!(
        "reconciled '{address}': {} field(s) with data, {} discrepancies",
        summary.fields_with_data,
        summary.discrepancies
    );

    Ok(LookupReport {
        meta: ReportMeta {
            registry: registry.name().to_string(),
            providers: labels.iter().map(|l| l.to_string()).collect(),
            address: address.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        statistics,
        discrepancies,
        comparison,
    })
}
