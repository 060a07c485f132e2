use std::path::PathBuf;

use parcelcheck_recon::model::DiscrepancyStatus;
use parcelcheck_recon::{
    build_comparison, compute_statistics, find_discrepancies, flatten_payload, normalize,
    reconcile, select_by_preference, validate, FieldRegistry, FlatRecord, LookupReport,
    DEFAULT_SEPARATOR,
};
use proptest::prelude::*;
use serde_json::Value;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_record(provider: &str) -> FlatRecord {
    let path = fixtures_dir().join(format!("{provider}.json"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    let payload: Value = serde_json::from_str(&text).unwrap();
    flatten_payload(provider, &payload, DEFAULT_SEPARATOR).unwrap()
}

fn load_and_reconcile() -> LookupReport {
    let registry = FieldRegistry::builtin().unwrap();
    let records = ["regrid", "smarty", "melissa"].map(load_record);
    reconcile(registry, "123 Main St, Anytown, CA 90210", &records).unwrap()
}

// -------------------------------------------------------------------------
// Fixture lookups
// -------------------------------------------------------------------------

#[test]
fn three_provider_report() {
    let report = load_and_reconcile();

    assert_eq!(report.meta.registry, "property");
    assert_eq!(report.comparison.len(), 185);
    assert_eq!(report.summary.fields, 185);
    assert_eq!(report.summary.fields_with_data, 9);
    assert!(report.summary.not_found.is_empty());

    let bedrooms = report.comparison.iter().find(|r| r.field_name == "bedrooms").unwrap();
    assert_eq!(bedrooms.values, vec!["3", "3", "4"]);

    let rooms = report.comparison.iter().find(|r| r.field_name == "rooms_total").unwrap();
    assert_eq!(rooms.values, vec!["", "", "7"]);
}

#[test]
fn three_provider_statistics() {
    let report = load_and_reconcile();
    let counts: Vec<_> = report
        .statistics
        .providers
        .iter()
        .map(|p| (p.provider.as_str(), p.available, p.unavailable, p.total))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("regrid", 7, 178, 185),
            ("smarty", 7, 178, 185),
            ("melissa", 5, 180, 185),
        ]
    );
}

#[test]
fn three_provider_discrepancies() {
    let report = load_and_reconcile();
    let found: Vec<_> = report
        .discrepancies
        .iter()
        .map(|d| (d.field_name.as_str(), d.status, d.providers_with_data))
        .collect();
    assert_eq!(
        found,
        vec![
            ("bathrooms_total", DiscrepancyStatus::AllDifferent, 3),
            ("parcel_number", DiscrepancyStatus::ProviderDiffers { slot: 0 }, 3),
            ("bedrooms", DiscrepancyStatus::ProviderDiffers { slot: 2 }, 3),
        ]
    );
    assert_eq!(report.summary.by_status["Regrid Differs"], 1);
    assert_eq!(report.summary.by_status["Melissa Differs"], 1);
    assert_eq!(report.summary.by_status["All Different"], 1);
}

#[test]
fn report_json_round_trips() {
    let report = load_and_reconcile();
    let json = serde_json::to_string(&report).unwrap();
    let back: LookupReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.comparison, report.comparison);
    assert_eq!(back.discrepancies, report.discrepancies);
}

#[test]
fn single_provider_answers() {
    let registry = FieldRegistry::builtin().unwrap();
    let records = [FlatRecord::new(), load_record("smarty"), FlatRecord::new()];
    let report = reconcile(registry, "x", &records).unwrap();

    assert!(report.discrepancies.is_empty());
    assert_eq!(report.summary.not_found, vec!["regrid", "melissa"]);
}

#[test]
fn preference_selection_over_report() {
    let report = load_and_reconcile();
    let order = ["melissa", "regrid"];
    let set = select_by_preference(&report.comparison, &report.meta.providers, &order).unwrap();

    assert_eq!(set.get("bedrooms").unwrap().value, "4");
    assert_eq!(set.get("owner_name").unwrap().provider, "Regrid");
    assert!(set.get("living_area_sqft").is_none());
}

#[test]
fn gate_then_reconcile() {
    let verdict = validate("123 Main St Anytown CA 90210");
    assert!(verdict.is_valid());
    assert_eq!(verdict.normalized(), "123 Main St, Anytown, CA 90210");

    let verdict = validate("Test Address 123");
    assert_eq!(verdict.verdict(), (false, Some("Test addresses not allowed")));
}

// -------------------------------------------------------------------------
// Properties
// -------------------------------------------------------------------------

fn address_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,5}",
        "[A-Z][a-z]{2,8}",
        "[A-Z]{2}",
        "[0-9]{5}",
        "[0-9]{5}-[0-9]{4}",
    ]
}

fn is_country_token(token: &str) -> bool {
    matches!(
        token.to_ascii_uppercase().as_str(),
        "US" | "USA" | "UAS" | "UNITED" | "STATES"
    )
}

fn flat_record() -> impl Strategy<Value = FlatRecord> {
    let registry = FieldRegistry::builtin().unwrap();
    let keys: Vec<String> = registry
        .fields()
        .iter()
        .flat_map(|f| (0..3).filter_map(move |slot| f.source_key(slot).map(str::to_string)))
        .collect();
    let value = prop_oneof![
        Just(Value::Null),
        Just(Value::from("")),
        Just(Value::from(0)),
        "[a-z0-9 ]{1,6}".prop_map(Value::from),
        (1u32..5000).prop_map(Value::from),
    ];
    proptest::collection::vec((proptest::sample::select(keys), value), 0..40)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn normalize_is_idempotent(tokens in proptest::collection::vec(address_token(), 0..8)) {
        prop_assume!(!tokens.iter().any(|t| is_country_token(t)));
        let once = normalize(&tokens.join("  \t"));
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn statistics_close_over_registry(a in flat_record(), b in flat_record(), c in flat_record()) {
        let registry = FieldRegistry::builtin().unwrap();
        let records = [a, b, c];
        let rows = build_comparison(registry, &records);
        prop_assert_eq!(rows.len(), registry.len());

        let stats = compute_statistics(registry, &records);
        for (slot, p) in stats.providers.iter().enumerate() {
            prop_assert_eq!(p.available + p.unavailable, p.total);
            prop_assert_eq!(p.total, registry.len());
            let non_empty = rows.iter().filter(|r| !r.value(slot).is_empty()).count();
            prop_assert_eq!(p.available, non_empty);
        }
    }

    #[test]
    fn discrepancies_need_two_reporting_providers(a in flat_record(), b in flat_record(), c in flat_record()) {
        let registry = FieldRegistry::builtin().unwrap();
        let rows = build_comparison(registry, &[a, b, c]);
        for d in find_discrepancies(&rows) {
            let reporting = d.values.iter().filter(|v| !v.is_empty()).count();
            prop_assert!(reporting >= 2);
            prop_assert_eq!(reporting, d.providers_with_data);

            let mut distinct: Vec<String> = d
                .values
                .iter()
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect();
            distinct.sort();
            distinct.dedup();
            prop_assert!(distinct.len() >= 2, "{} agrees: {:?}", d.field_name, d.values);
        }
    }

    #[test]
    fn adding_data_never_lowers_availability(base in flat_record(), extra in flat_record()) {
        let registry = FieldRegistry::builtin().unwrap();
        let before = compute_statistics(registry, &[base.clone()]);

        let mut grown = base.clone();
        for (k, v) in extra.iter() {
            if base.text(k).is_none() {
                grown.insert(k.clone(), v.clone());
            }
        }
        let after = compute_statistics(registry, &[grown]);
        prop_assert!(after.providers[0].available >= before.providers[0].available);
    }
}
