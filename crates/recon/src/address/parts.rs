use serde::{Deserialize, Serialize};

/// Components of a normalized `Street, City, STATE ZIP` address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressParts {
    /// Split a normalized address. Missing components come back empty.
    ///
    /// The state and ZIP may share the last comma part (`TX 75063`) or sit in
    /// separate parts (`TX, 75063`).
    pub fn parse(normalized: &str) -> Self {
        let parts: Vec<&str> = normalized.split(',').map(str::trim).collect();
        let street = parts.first().copied().unwrap_or_default().to_string();
        let city = parts.get(1).copied().unwrap_or_default().to_string();

        let mut state = String::new();
        let mut zip = String::new();
        for token in parts.iter().skip(2).flat_map(|p| p.split_whitespace()) {
            if zip.is_empty() && token.starts_with(|c: char| c.is_ascii_digit()) {
                zip = token.to_string();
            } else if state.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic()) {
                state = token.to_uppercase();
            }
        }

        Self { street, city, state, zip }
    }

    /// First five digits of the ZIP (drops a `+4` suffix).
    pub fn zip5(&self) -> &str {
        self.zip.split('-').next().unwrap_or_default()
    }
}
