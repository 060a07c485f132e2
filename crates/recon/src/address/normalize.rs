use once_cell::sync::Lazy;
use regex::Regex;

use super::policy::nearest_state;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TRAILING_COUNTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(US|USA|UAS|UNITED STATES)\b$").unwrap());
static ZIP_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());
static STATE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]{2}$").unwrap());

/// Rewrite a loosely formatted address into `Street, City, STATE ZIP`.
///
/// Accepted shapes include:
/// - `519 Raton Pass, Irving, TX 75063` (already formatted, returned as-is)
/// - `519 Raton Pass Irving TX 75063`
/// - `Irving 519 Raton Pass TX 75063`
/// - `519 Raton Pass Irving TX 75063 USA`
/// - `436 Red River Trl #1112\tIrving\t75063\tTX`
///
/// When the structure cannot be inferred the whitespace-cleaned input is
/// returned unchanged; validation will then reject it.
pub fn normalize(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let address = TRAILING_COUNTRY.replace(&collapsed, "").trim().to_string();

    if address.contains(',') {
        return address;
    }

    infer_structure(&address).unwrap_or(address)
}

fn infer_structure(address: &str) -> Option<String> {
    let tokens: Vec<&str> = address.split(' ').filter(|t| !t.is_empty()).collect();
    if tokens.len() < 4 {
        return None;
    }

    let (zip_index, zip_token) = tokens
        .iter()
        .copied()
        .enumerate()
        .find(|(_, t)| ZIP_TOKEN.is_match(t))?;
    let zip = zip_token.split('-').next().unwrap_or(zip_token);

    let candidates: Vec<(usize, &str)> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| STATE_TOKEN.is_match(t))
        .map(|(i, t)| (i, *t))
        .collect();
    let (state_index, state) = nearest_state(&candidates, zip_index)?;

    let remaining: Vec<&str> = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != zip_index && *i != state_index)
        .map(|(_, t)| *t)
        .collect();
    if remaining.len() < 2 {
        return None;
    }

    let first = remaining[0].chars().next()?;
    let (street, city) = if first.is_ascii_digit() {
        let (city, street) = remaining.split_last()?;
        (street.join(" "), *city)
    } else if first.is_alphabetic() {
        let (city, street) = remaining.split_first()?;
        (street.join(" "), *city)
    } else {
        return None;
    };

    Some(format!("{street}, {city}, {} {zip}", state.to_uppercase()))
}
