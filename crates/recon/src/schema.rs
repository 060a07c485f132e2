use std::collections::{BTreeMap, HashSet};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

/// Upper bound on providers a registry may declare.
pub const MAX_PROVIDERS: usize = 3;

const BUILTIN_REGISTRY: &str = include_str!("../data/fields.toml");

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RegistryFile {
    name: String,
    providers: Vec<ProviderSpec>,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
struct FieldEntry {
    name: String,
    #[serde(default)]
    section: Option<String>,
    /// provider id -> provider-specific flattened key
    #[serde(default)]
    sources: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Registry types
// ---------------------------------------------------------------------------

/// A data provider slot. Slot order is the order of `[[providers]]` in the
/// registry file and is the order every per-provider vector follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Keys whose presence in a flattened record marks it as real property data.
    #[serde(default)]
    pub markers: Vec<String>,
}

impl ProviderSpec {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// A provider-agnostic property attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalField {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// One entry per provider slot; `None` when the provider never reports it.
    pub source_keys: Vec<Option<String>>,
}

impl CanonicalField {
    pub fn source_key(&self, slot: usize) -> Option<&str> {
        self.source_keys.get(slot).and_then(|k| k.as_deref())
    }
}

/// Ordered, immutable table of canonical fields.
///
/// Its length is the fixed universe used as the statistics denominator and
/// the size of every comparison.
#[derive(Debug, Clone, Serialize)]
pub struct FieldRegistry {
    name: String,
    providers: Vec<ProviderSpec>,
    fields: Vec<CanonicalField>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl FieldRegistry {
    /// The embedded property registry, parsed on first use.
    pub fn builtin() -> Result<&'static FieldRegistry, ReconError> {
        static BUILTIN: OnceCell<FieldRegistry> = OnceCell::new();
        BUILTIN.get_or_try_init(|| Self::from_toml(BUILTIN_REGISTRY))
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let file: RegistryFile =
            toml::from_str(input).map_err(|e| ReconError::RegistryParse(e.to_string()))?;
        Self::from_file(file)
    }

    fn from_file(file: RegistryFile) -> Result<Self, ReconError> {
        if file.providers.is_empty() || file.providers.len() > MAX_PROVIDERS {
            return Err(ReconError::ProviderCount {
                found: file.providers.len(),
                max: MAX_PROVIDERS,
            });
        }

        let mut provider_ids = HashSet::new();
        for p in &file.providers {
            if p.id.trim().is_empty() {
                return Err(ReconError::RegistryValidation("provider id must not be empty".into()));
            }
            if !provider_ids.insert(p.id.as_str()) {
                return Err(ReconError::RegistryValidation(format!(
                    "provider '{}' declared twice",
                    p.id
                )));
            }
        }

        if file.fields.is_empty() {
            return Err(ReconError::RegistryValidation(
                "at least 1 field is required".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut fields = Vec::with_capacity(file.fields.len());
        for entry in file.fields {
            if entry.name.trim().is_empty() {
                return Err(ReconError::RegistryValidation("field name must not be empty".into()));
            }
            if !names.insert(entry.name.clone()) {
                return Err(ReconError::DuplicateField(entry.name));
            }

            for provider in entry.sources.keys() {
                if !provider_ids.contains(provider.as_str()) {
                    return Err(ReconError::RegistryValidation(format!(
                        "field '{}': unknown provider '{provider}'",
                        entry.name
                    )));
                }
            }

            let source_keys = file
                .providers
                .iter()
                .map(|p| {
                    entry
                        .sources
                        .get(&p.id)
                        .map(|k| k.trim())
                        .filter(|k| !k.is_empty())
                        .map(str::to_string)
                })
                .collect();

            fields.push(CanonicalField {
                name: entry.name,
                section: entry.section,
                source_keys,
            });
        }

        Ok(Self {
            name: file.name,
            providers: file.providers,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn provider_slot(&self, id: &str) -> Option<usize> {
        self.providers
            .iter()
            .position(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn source_key(&self, field: &str, provider: &str) -> Option<&str> {
        let slot = self.provider_slot(provider)?;
        self.field(field)?.source_key(slot)
    }

    /// Section names in first-appearance order.
    pub fn sections(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter_map(|f| f.section.as_deref())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Display labels for every provider slot, in slot order.
    pub fn labels(&self) -> Vec<&str> {
        self.providers.iter().map(ProviderSpec::label).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
name = "small"

[[providers]]
id = "a"
display_name = "Alpha"
markers = ["id"]

[[providers]]
id = "b"

[[fields]]
name = "year_built"
section = "Basic"
sources = { a = "yearbuilt", b = "year_built" }

[[fields]]
name = "owner"
section = "Owner"
sources = { b = "owner_full_name" }
"#;

    #[test]
    fn parse_small_registry() {
        let reg = FieldRegistry::from_toml(SMALL).unwrap();
        assert_eq!(reg.name(), "small");
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.providers().len(), 2);
        assert_eq!(reg.labels(), vec!["Alpha", "b"]);
        assert_eq!(reg.source_key("year_built", "a"), Some("yearbuilt"));
        assert_eq!(reg.source_key("owner", "a"), None);
        assert_eq!(reg.source_key("owner", "B"), Some("owner_full_name"));
        assert_eq!(reg.sections(), vec!["Basic", "Owner"]);
    }

    #[test]
    fn source_keys_align_with_provider_slots() {
        let reg = FieldRegistry::from_toml(SMALL).unwrap();
        let owner = reg.field("owner").unwrap();
        assert_eq!(owner.source_keys, vec![None, Some("owner_full_name".to_string())]);
    }

    #[test]
    fn builtin_registry_loads() {
        let reg = FieldRegistry::builtin().unwrap();
        assert_eq!(reg.len(), 185);
        assert_eq!(reg.labels(), vec!["Regrid", "Smarty", "Melissa"]);
        assert_eq!(
            reg.source_key("year_built", "melissa"),
            Some("PropertyUseInfo_YearBuilt")
        );
        assert_eq!(reg.fields()[0].name, "year_built");
        assert_eq!(reg.fields().last().unwrap().name, "data_subset_name");
    }

    #[test]
    fn builtin_registry_field_names_unique() {
        let reg = FieldRegistry::builtin().unwrap();
        let names: HashSet<_> = reg.fields().iter().map(|f| &f.name).collect();
        assert_eq!(names.len(), reg.len());
    }

    #[test]
    fn reject_duplicate_field() {
        let input = format!(
            r#"{SMALL}
[[fields]]
name = "owner"
sources = {{ a = "owner" }}
"#
        );
        let err = FieldRegistry::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::DuplicateField(ref n) if n == "owner"));
    }

    #[test]
    fn reject_unknown_provider_in_sources() {
        let input = r#"
name = "bad"
[[providers]]
id = "a"
[[fields]]
name = "x"
sources = { c = "x" }
"#;
        let err = FieldRegistry::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("unknown provider 'c'"));
    }

    #[test]
    fn reject_too_many_providers() {
        let input = r#"
name = "bad"
[[providers]]
id = "a"
[[providers]]
id = "b"
[[providers]]
id = "c"
[[providers]]
id = "d"
[[fields]]
name = "x"
"#;
        let err = FieldRegistry::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("1 to 3 provider(s), found 4"));
    }

    #[test]
    fn reject_empty_field_list() {
        let input = r#"
name = "bad"
[[providers]]
id = "a"
"#;
        let err = FieldRegistry::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("at least 1 field"));
    }

    #[test]
    fn blank_source_key_means_absent() {
        let input = r#"
name = "blank"
[[providers]]
id = "a"
[[fields]]
name = "x"
sources = { a = "  " }
"#;
        let reg = FieldRegistry::from_toml(input).unwrap();
        assert_eq!(reg.field("x").unwrap().source_key(0), None);
    }
}
