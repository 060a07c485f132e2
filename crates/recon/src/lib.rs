//! `parcelcheck-recon`: address gate and multi-provider property field
//! reconciliation.
//!
//! Pure engine crate: receives raw provider payloads, returns aligned
//! comparisons, availability statistics and discrepancies.
//! No network or CLI dependencies.

pub mod address;
pub mod compare;
pub mod discrepancy;
pub mod engine;
pub mod error;
pub mod export;
pub mod flatten;
pub mod model;
pub mod schema;
pub mod selection;
pub mod stats;
pub mod summary;

pub use address::{normalize, validate, AddressParts, Rejection, Validation};
pub use compare::build_comparison;
pub use discrepancy::find_discrepancies;
pub use engine::{check_property_data, reconcile};
pub use error::ReconError;
pub use flatten::{flatten, flatten_payload, DEFAULT_SEPARATOR};
pub use model::{
    AvailabilityStats, ComparisonRow, Discrepancy, DiscrepancyStatus, FlatRecord, LookupReport,
    ProviderStats,
};
pub use schema::{CanonicalField, FieldRegistry, ProviderSpec, MAX_PROVIDERS};
pub use selection::{select_by_preference, select_explicit, Selection, SelectionSet, SkippedPick};
pub use stats::compute_statistics;
