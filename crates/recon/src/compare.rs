use crate::model::{ComparisonRow, FlatRecord};
use crate::schema::FieldRegistry;

/// Resolve one canonical field for one provider slot.
///
/// Empty when the slot has no source key for the field, the key is missing
/// from the record, or the value carries no data.
pub(crate) fn resolve(
    registry: &FieldRegistry,
    records: &[FlatRecord],
    field_index: usize,
    slot: usize,
) -> Option<String> {
    let key = registry.fields().get(field_index)?.source_key(slot)?;
    records.get(slot)?.text(key)
}

/// Build one aligned row per canonical field, in registry order.
///
/// `records` are the flattened provider responses in provider-slot order.
/// A slot without a record is treated as an empty response, so the output
/// always has exactly `registry.len()` rows of `registry.providers().len()`
/// values each.
pub fn build_comparison(registry: &FieldRegistry, records: &[FlatRecord]) -> Vec<ComparisonRow> {
    let slots = registry.providers().len();
    if records.len() > slots {
        log::debug!(
            "build_comparison: ignoring {} record(s) beyond {slots} provider slot(s)",
            records.len() - slots
        );
    }

    registry
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| ComparisonRow {
            field_name: field.name.clone(),
            values: (0..slots)
                .map(|slot| resolve(registry, records, i, slot).unwrap_or_default())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REG: &str = r#"
name = "t"
[[providers]]
id = "regrid"
[[providers]]
id = "smarty"
[[providers]]
id = "melissa"

[[fields]]
name = "year_built"
sources = { regrid = "yearbuilt", smarty = "year_built", melissa = "PropertyUseInfo_YearBuilt" }

[[fields]]
name = "living_area_sqft"
sources = { smarty = "gross_sqft" }

[[fields]]
name = "owner_name"
sources = { regrid = "owner", smarty = "owner_full_name", melissa = "PrimaryOwner_Name1Full" }
"#;

    fn rec(v: serde_json::Value) -> FlatRecord {
        crate::flatten::flatten_payload("t", &v, "_").unwrap()
    }

    #[test]
    fn rows_follow_registry_order_and_slots() {
        let reg = FieldRegistry::from_toml(REG).unwrap();
        let records = vec![
            rec(json!({ "yearbuilt": 1998, "owner": "Smith, John", "gross_sqft": "ignored" })),
            rec(json!({ "year_built": "1998", "gross_sqft": 2100 })),
            rec(json!({ "PropertyUseInfo": { "YearBuilt": "1998" } })),
        ];
        let rows = build_comparison(&reg, &records);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].field_name, "year_built");
        assert_eq!(rows[0].values, vec!["1998", "1998", "1998"]);
        // Regrid has "gross_sqft" but no source key for the field
        assert_eq!(rows[1].values, vec!["", "2100", ""]);
        assert_eq!(rows[2].values, vec!["Smith, John", "", ""]);
    }

    #[test]
    fn empty_and_missing_records_still_produce_every_row() {
        let reg = FieldRegistry::from_toml(REG).unwrap();
        let rows = build_comparison(&reg, &[]);
        assert_eq!(rows.len(), reg.len());
        assert!(rows.iter().all(|r| r.values == vec!["", "", ""]));

        let rows = build_comparison(&reg, &[FlatRecord::new()]);
        assert_eq!(rows.len(), reg.len());
    }

    #[test]
    fn falsy_values_are_empty() {
        let reg = FieldRegistry::from_toml(REG).unwrap();
        let records = vec![rec(json!({ "yearbuilt": 0, "owner": "" }))];
        let rows = build_comparison(&reg, &records);
        assert_eq!(rows[0].value(0), "");
        assert_eq!(rows[2].value(0), "");
    }
}
