use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Single-level view of one provider response.
///
/// Leaves keep their JSON scalar type so availability can tell a real `"0"`
/// string from a numeric zero; arrays of scalars are already stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    entries: BTreeMap<String, Value>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a leaf. A later insert under the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// The value as display text, or `None` when the key is missing or the
    /// value carries no data (null, `false`, zero, empty string).
    pub fn text(&self, key: &str) -> Option<String> {
        let value = self.entries.get(key)?;
        if !is_truthy(value) {
            return None;
        }
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl FromIterator<(String, Value)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// One canonical field aligned across every provider slot.
/// An empty string means the provider has no data for the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub field_name: String,
    pub values: Vec<String>,
}

impl ComparisonRow {
    pub fn value(&self, slot: usize) -> &str {
        self.values.get(slot).map(String::as_str).unwrap_or_default()
    }

    pub fn has_data(&self) -> bool {
        self.values.iter().any(|v| !v.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider: String,
    pub available: usize,
    pub unavailable: usize,
    pub total: usize,
}

impl ProviderStats {
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.available as f64 * 100.0 / self.total as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityStats {
    pub providers: Vec<ProviderStats>,
}

impl AvailabilityStats {
    pub fn get(&self, provider: &str) -> Option<&ProviderStats> {
        self.providers.iter().find(|p| p.provider == provider)
    }

    /// Providers that returned nothing usable for any canonical field.
    pub fn not_found(&self) -> Vec<&str> {
        self.providers
            .iter()
            .filter(|p| p.available == 0)
            .map(|p| p.provider.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Discrepancies
// ---------------------------------------------------------------------------

/// Kind of disagreement. Variant order is the report sort priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyStatus {
    /// Three or more providers reported and no two agree.
    AllDifferent,
    /// Two providers reported and they disagree.
    ValuesDiffer,
    /// Every reporting provider agrees except the one in `slot`.
    ProviderDiffers { slot: usize },
}

impl DiscrepancyStatus {
    /// Human label; `labels` are provider display names in slot order.
    pub fn label(&self, labels: &[&str]) -> String {
        match self {
            Self::AllDifferent => "All Different".to_string(),
            Self::ValuesDiffer => "Values Differ".to_string(),
            Self::ProviderDiffers { slot } => match labels.get(*slot) {
                Some(name) => format!("{name} Differs"),
                None => format!("Provider {} Differs", slot + 1),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field_name: String,
    pub status: DiscrepancyStatus,
    /// Trimmed values per slot, original case.
    pub values: Vec<String>,
    pub providers_with_data: usize,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub registry: String,
    pub providers: Vec<String>,
    pub address: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub fields: usize,
    pub fields_with_data: usize,
    pub discrepancies: usize,
    /// Discrepancy count per status label.
    pub by_status: BTreeMap<String, usize>,
    /// Providers with zero available fields.
    pub not_found: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupReport {
    pub meta: ReportMeta,
    pub summary: ReportSummary,
    pub statistics: AvailabilityStats,
    pub discrepancies: Vec<Discrepancy>,
    pub comparison: Vec<ComparisonRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_skips_falsy_values() {
        let rec: FlatRecord = [
            ("a".to_string(), json!("")),
            ("b".to_string(), json!(0)),
            ("c".to_string(), json!(false)),
            ("d".to_string(), Value::Null),
            ("e".to_string(), json!("0")),
            ("f".to_string(), json!(1998)),
            ("g".to_string(), json!(2.5)),
            ("h".to_string(), json!(true)),
        ]
        .into_iter()
        .collect();

        assert_eq!(rec.text("a"), None);
        assert_eq!(rec.text("b"), None);
        assert_eq!(rec.text("c"), None);
        assert_eq!(rec.text("d"), None);
        assert_eq!(rec.text("e").as_deref(), Some("0"));
        assert_eq!(rec.text("f").as_deref(), Some("1998"));
        assert_eq!(rec.text("g").as_deref(), Some("2.5"));
        assert_eq!(rec.text("h").as_deref(), Some("true"));
        assert_eq!(rec.text("missing"), None);
    }

    #[test]
    fn status_labels_and_order() {
        let labels = ["Regrid", "Smarty", "Melissa"];
        assert_eq!(DiscrepancyStatus::AllDifferent.label(&labels), "All Different");
        assert_eq!(
            DiscrepancyStatus::ProviderDiffers { slot: 1 }.label(&labels),
            "Smarty Differs"
        );
        assert_eq!(
            DiscrepancyStatus::ProviderDiffers { slot: 5 }.label(&labels),
            "Provider 6 Differs"
        );
        assert!(DiscrepancyStatus::AllDifferent < DiscrepancyStatus::ValuesDiffer);
        assert!(
            DiscrepancyStatus::ValuesDiffer < DiscrepancyStatus::ProviderDiffers { slot: 0 }
        );
        assert!(
            DiscrepancyStatus::ProviderDiffers { slot: 0 }
                < DiscrepancyStatus::ProviderDiffers { slot: 2 }
        );
    }

    #[test]
    fn coverage_and_not_found() {
        let stats = AvailabilityStats {
            providers: vec![
                ProviderStats { provider: "a".into(), available: 1, unavailable: 3, total: 4 },
                ProviderStats { provider: "b".into(), available: 0, unavailable: 4, total: 4 },
            ],
        };
        assert_eq!(stats.get("a").unwrap().coverage_percent(), 25.0);
        assert_eq!(stats.not_found(), vec!["b"]);
        let empty = ProviderStats { provider: "c".into(), available: 0, unavailable: 0, total: 0 };
        assert_eq!(empty.coverage_percent(), 0.0);
    }
}
