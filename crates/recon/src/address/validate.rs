use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use super::policy::{is_placeholder_house_number, is_placeholder_zip, HOUSE_NUMBER_RANGE};

const MIN_LENGTH: usize = 10;

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").unwrap());
static UNIT_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\d+").unwrap());
static STATE_OR_ZIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z]{2}\b|\b\d{5}(?:-\d{4})?\b").unwrap());
static ZIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").unwrap());
static DIGITS_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s,]+$").unwrap());

static BLOCKED_WORDS: Lazy<Vec<(Regex, Blocked)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(?i)test\s*address").unwrap(), Blocked::TestAddress),
        (Regex::new(r"(?i)example").unwrap(), Blocked::Example),
        (Regex::new(r"(?i)fake").unwrap(), Blocked::Fake),
        (Regex::new(r"(?i)asdf|qwerty").unwrap(), Blocked::KeyboardMash),
    ]
});

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Known low-signal inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocked {
    TestAddress,
    Example,
    Fake,
    KeyboardMash,
    NoText,
}

/// Why an address was rejected before any provider was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    TooShort,
    Incomplete,
    MissingStreetOrCity,
    MissingHouseNumber,
    InvalidHouseNumber,
    PlaceholderHouseNumber,
    MissingStreetName,
    MissingStateOrZip,
    InvalidZip,
    Blocked(Blocked),
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TooShort => "Address too short (minimum 10 characters)",
            Self::Incomplete => "Address format incomplete (need: Street, City, State ZIP)",
            Self::MissingStreetOrCity => "Address must include at least Street and City",
            Self::MissingHouseNumber => "Street address must include a house number",
            Self::InvalidHouseNumber => "Invalid house number",
            Self::PlaceholderHouseNumber => "Invalid house number pattern",
            Self::MissingStreetName => "Street name missing",
            Self::MissingStateOrZip => "State or ZIP missing",
            Self::InvalidZip => "Invalid ZIP code",
            Self::Blocked(Blocked::TestAddress) => "Test addresses not allowed",
            Self::Blocked(Blocked::Example) => "Example addresses not allowed",
            Self::Blocked(Blocked::Fake) => "Fake addresses not allowed",
            Self::Blocked(Blocked::KeyboardMash) => "Invalid address format",
            Self::Blocked(Blocked::NoText) => "Address must include text",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Passed every check; carries the normalized form.
    Valid { normalized: String },
    Rejected { normalized: String, reason: Rejection },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn normalized(&self) -> &str {
        match self {
            Self::Valid { normalized } | Self::Rejected { normalized, .. } => normalized,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Valid { .. } => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }

    /// `(ok, reason)` form for callers that only need the verdict.
    pub fn verdict(&self) -> (bool, Option<&'static str>) {
        (self.is_valid(), self.rejection().map(|r| r.message()))
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Structural and plausibility gate, run before any provider is queried.
///
/// The input is normalized first. Named placeholder words ("test address",
/// "example", ...) are screened ahead of the structural checks; the
/// remaining checks run in order and the first failure wins.
pub fn validate(raw: &str) -> Validation {
    let normalized = normalize(raw).trim().to_string();
    log::debug!("address validation: original '{raw}', normalized '{normalized}'");

    match check(&normalized) {
        Ok(()) => Validation::Valid { normalized },
        Err(reason) => {
            log::info!("address rejected: '{raw}' ({reason})");
            Validation::Rejected { normalized, reason }
        }
    }
}

fn check(address: &str) -> Result<(), Rejection> {
    // Blocked words win over every structural reason, so "Test Address 123"
    // and "1 Fake St" report the placeholder rather than "too short".
    if let Some((_, blocked)) = BLOCKED_WORDS.iter().find(|(re, _)| re.is_match(address)) {
        return Err(Rejection::Blocked(*blocked));
    }

    if address.chars().count() < MIN_LENGTH {
        return Err(Rejection::TooShort);
    }

    if !address.contains(',') {
        return Err(Rejection::Incomplete);
    }

    let parts: Vec<&str> = address
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 2 {
        return Err(Rejection::MissingStreetOrCity);
    }

    let street = parts[0];
    check_street(street)?;

    let last = parts[parts.len() - 1];
    if !STATE_OR_ZIP.is_match(last) {
        return Err(Rejection::MissingStateOrZip);
    }
    if let Some(zip) = ZIP.captures(last).and_then(|c| c.get(1)) {
        if is_placeholder_zip(zip.as_str()) {
            return Err(Rejection::InvalidZip);
        }
    }

    if DIGITS_ONLY.is_match(address) {
        return Err(Rejection::Blocked(Blocked::NoText));
    }

    Ok(())
}

fn check_street(street: &str) -> Result<(), Rejection> {
    if !DIGIT.is_match(street) {
        return Err(Rejection::MissingHouseNumber);
    }

    if let Some(digits) = LEADING_NUMBER.captures(street).and_then(|c| c.get(1)) {
        let digits = digits.as_str();
        // Runs too long for u64 are far outside the range anyway.
        let in_range = digits
            .parse::<u64>()
            .map(|n| HOUSE_NUMBER_RANGE.contains(&n))
            .unwrap_or(false);
        if !in_range {
            return Err(Rejection::InvalidHouseNumber);
        }
        if is_placeholder_house_number(digits) {
            return Err(Rejection::PlaceholderHouseNumber);
        }
    }

    if street.split_whitespace().count() < 2 && !UNIT_MARKER.is_match(street) {
        return Err(Rejection::MissingStreetName);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(raw: &str) -> Option<Rejection> {
        validate(raw).rejection()
    }

    #[test]
    fn valid_formatted_address() {
        let v = validate("123 Main St, Anytown, CA 90210");
        assert!(v.is_valid());
        assert_eq!(v.verdict(), (true, None));
        assert_eq!(v.normalized(), "123 Main St, Anytown, CA 90210");
    }

    #[test]
    fn valid_after_normalization() {
        let v = validate("436 Red River Trl #1112\tIrving\t75063\tTX");
        assert!(v.is_valid());
        assert_eq!(v.normalized(), "436 Red River Trl #1112, Irving, TX 75063");
    }

    #[test]
    fn test_address_is_blocked() {
        let v = validate("Test Address 123");
        assert_eq!(v.verdict(), (false, Some("Test addresses not allowed")));
    }

    #[test]
    fn blocked_words() {
        assert_eq!(
            reason("1 Example Rd, Springfield, IL 62704"),
            Some(Rejection::Blocked(Blocked::Example))
        );
        assert_eq!(
            reason("12 Fake St, Springfield, IL 62704"),
            Some(Rejection::Blocked(Blocked::Fake))
        );
        assert_eq!(
            reason("12 Asdf Ln, Springfield, IL 62704"),
            Some(Rejection::Blocked(Blocked::KeyboardMash))
        );
    }

    #[test]
    fn blocked_word_wins_over_structure() {
        assert_eq!(reason("1 Fake St"), Some(Rejection::Blocked(Blocked::Fake)));
        assert_eq!(reason("1 Main St"), Some(Rejection::TooShort));
    }

    #[test]
    fn too_short() {
        assert_eq!(reason("1 A St"), Some(Rejection::TooShort));
    }

    #[test]
    fn missing_comma() {
        assert_eq!(reason("123 Main Street Anytown"), Some(Rejection::Incomplete));
    }

    #[test]
    fn missing_city() {
        assert_eq!(reason("123 Main Street,  ,"), Some(Rejection::MissingStreetOrCity));
    }

    #[test]
    fn missing_house_number() {
        assert_eq!(
            reason("Main Street, Anytown, CA 90210"),
            Some(Rejection::MissingHouseNumber)
        );
    }

    #[test]
    fn house_number_out_of_range() {
        assert_eq!(
            reason("0 Main St, Anytown, CA 90210"),
            Some(Rejection::InvalidHouseNumber)
        );
        assert_eq!(
            reason("123456 Main St, Anytown, CA 90210"),
            Some(Rejection::InvalidHouseNumber)
        );
        assert_eq!(
            reason("99999999999999999999999 Main St, Anytown, CA 90210"),
            Some(Rejection::InvalidHouseNumber)
        );
    }

    #[test]
    fn placeholder_house_number() {
        assert_eq!(
            reason("11111 Main St, Anytown, CA 90210"),
            Some(Rejection::PlaceholderHouseNumber)
        );
        assert!(validate("7 Main St, Anytown, CA 90210").is_valid());
    }

    #[test]
    fn street_name_missing_unless_unit() {
        assert_eq!(
            reason("123, Anytown, CA 90210"),
            Some(Rejection::MissingStreetName)
        );
        assert!(validate("Apt#12, Anytown, CA 90210").is_valid());
    }

    #[test]
    fn state_or_zip_missing() {
        assert_eq!(
            reason("123 Main St, Anytown"),
            Some(Rejection::MissingStateOrZip)
        );
        assert!(validate("123 Main St, Anytown, CA").is_valid());
        assert!(validate("123 Main St, Anytown 90210").is_valid());
    }

    #[test]
    fn placeholder_zip() {
        assert_eq!(
            reason("123 Main St, Anytown, CA 00000"),
            Some(Rejection::InvalidZip)
        );
        assert_eq!(
            reason("123 Main St, Anytown, CA 11111-2222"),
            Some(Rejection::InvalidZip)
        );
    }

    #[test]
    fn digits_only_is_blocked() {
        assert_eq!(
            reason("123 456, 789 12345"),
            Some(Rejection::Blocked(Blocked::NoText))
        );
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(Rejection::InvalidZip.to_string(), "Invalid ZIP code");
        assert_eq!(
            Rejection::Blocked(Blocked::NoText).message(),
            "Address must include text"
        );
    }
}
