use crate::compare::resolve;
use crate::model::{AvailabilityStats, FlatRecord, ProviderStats};
use crate::schema::FieldRegistry;

/// Count, per provider, the canonical fields it has a value for.
///
/// Walks the registry directly rather than a comparison, so
/// `available + unavailable == total == registry.len()` for every provider
/// no matter how many providers answered.
pub fn compute_statistics(registry: &FieldRegistry, records: &[FlatRecord]) -> AvailabilityStats {
    let total = registry.len();

    let providers = registry
        .providers()
        .iter()
        .enumerate()
        .map(|(slot, provider)| {
            let available = (0..total)
                .filter(|&i| resolve(registry, records, i, slot).is_some())
                .count();
            log::debug!(
                "availability: {} {available} + {} = {total}",
                provider.id,
                total - available
            );
            ProviderStats {
                provider: provider.id.clone(),
                available,
                unavailable: total - available,
                total,
            }
        })
        .collect();

    AvailabilityStats { providers }
}
