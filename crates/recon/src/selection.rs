//! Per-field provider selections and the merged record they produce.

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::ComparisonRow;

/// One chosen value for one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub field: String,
    pub provider: String,
    pub value: String,
}

/// A pick that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPick {
    pub field: String,
    pub provider: String,
    pub reason: String,
}

/// Selections keyed by field, kept in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    selections: Vec<Selection>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the selection for `selection.field`.
    pub fn insert(&mut self, selection: Selection) {
        match self.selections.iter_mut().find(|s| s.field == selection.field) {
            Some(existing) => *existing = selection,
            None => self.selections.push(selection),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Selection> {
        self.selections.iter().find(|s| s.field == field)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.selections.iter()
    }

    /// Field name to chosen value.
    pub fn merged(&self) -> serde_json::Map<String, serde_json::Value> {
        self.selections
            .iter()
            .map(|s| (s.field.clone(), serde_json::Value::String(s.value.clone())))
            .collect()
    }

    /// Build the saved-selection document.
    pub fn export(&self, address: &str) -> SelectionExport {
        SelectionExport {
            address: address.to_string(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            selected_fields_count: self.len(),
            fields: self.selections.clone(),
            merged_data: self.merged(),
        }
    }

    /// Write `Field Name,Provider,Value` CSV. The header is always written.
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<(), ReconError> {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        let io = |e: csv::Error| ReconError::Io(format!("CSV write error: {e}"));

        wtr.write_record(["Field Name", "Provider", "Value"]).map_err(io)?;
        for s in &self.selections {
            wtr.write_record([s.field.as_str(), s.provider.as_str(), s.value.as_str()])
                .map_err(io)?;
        }
        wtr.flush()
            .map_err(|e| ReconError::Io(format!("CSV flush error: {e}")))
    }
}

/// JSON document for a saved selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionExport {
    pub address: String,
    pub saved_at: String,
    pub selected_fields_count: usize,
    pub fields: Vec<Selection>,
    pub merged_data: serde_json::Map<String, serde_json::Value>,
}

fn slot_of(providers: &[String], name: &str) -> Option<usize> {
    providers.iter().position(|p| p.eq_ignore_ascii_case(name))
}

/// For each row, take the first provider in `order` with a non-empty value.
///
/// `providers` are the provider names in slot order; names in `order` match
/// them case-insensitively. Rows where no preferred provider has data are
/// left out.
pub fn select_by_preference(
    rows: &[ComparisonRow],
    providers: &[String],
    order: &[&str],
) -> Result<SelectionSet, ReconError> {
    let slots = order
        .iter()
        .map(|name| slot_of(providers, name).ok_or_else(|| ReconError::UnknownProvider(name.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    let mut set = SelectionSet::new();
    for row in rows {
        let chosen = slots.iter().find_map(|&slot| {
            let value = row.value(slot).trim();
            (!value.is_empty()).then(|| (slot, value))
        });
        if let Some((slot, value)) = chosen {
            set.insert(Selection {
                field: row.field_name.clone(),
                provider: providers[slot].clone(),
                value: value.to_string(),
            });
        }
    }
    log::debug!("select_by_preference: {} of {} field(s) selected", set.len(), rows.len());
    Ok(set)
}

/// Apply explicit `(field, provider)` picks.
///
/// Picks naming an unknown field or provider, or one with no value, are
/// returned as skipped. A later pick for the same field replaces an earlier one.
pub fn select_explicit(
    rows: &[ComparisonRow],
    providers: &[String],
    picks: &[(String, String)],
) -> (SelectionSet, Vec<SkippedPick>) {
    let mut set = SelectionSet::new();
    let mut skipped = Vec::new();

    for (field, provider) in picks {
        let skip = |reason: &str| SkippedPick {
            field: field.clone(),
            provider: provider.clone(),
            reason: reason.to_string(),
        };

        let Some(row) = rows.iter().find(|r| r.field_name == *field) else {
            skipped.push(skip("unknown field"));
            continue;
        };
        let Some(slot) = slot_of(providers, provider) else {
            skipped.push(skip("unknown provider"));
            continue;
        };
        let value = row.value(slot).trim();
        if value.is_empty() {
            skipped.push(skip("no value"));
            continue;
        }

        set.insert(Selection {
            field: field.clone(),
            provider: providers[slot].clone(),
            value: value.to_string(),
        });
    }

    for s in &skipped {
        log::warn!("skipping pick {}={}: {}", s.field, s.provider, s.reason);
    }
    (set, skipped)
}
