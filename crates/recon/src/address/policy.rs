//! Heuristic choices behind the normalizer and validator.
//!
//! These are tuning knobs rather than structural parsing rules, so they live
//! apart from the code that tokenizes and splits addresses.

/// Smallest and largest accepted house number.
pub const HOUSE_NUMBER_RANGE: std::ops::RangeInclusive<u64> = 1..=99_999;

/// Pick the state candidate nearest the ZIP token.
///
/// Distance is the absolute token-index difference. Ties go to the candidate
/// that appears first.
pub fn nearest_state<'a>(candidates: &[(usize, &'a str)], zip_index: usize) -> Option<(usize, &'a str)> {
    candidates
        .iter()
        .copied()
        .min_by_key(|(i, _)| i.abs_diff(zip_index))
}

/// True for runs of one repeated digit of at least `min_len` characters
/// ("1111", "99999").
pub fn is_repeated_digit_run(s: &str, min_len: usize) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_digit() && s.chars().count() >= min_len && chars.all(|c| c == first)
}

/// House numbers made of one repeated digit are placeholders.
pub fn is_placeholder_house_number(digits: &str) -> bool {
    is_repeated_digit_run(digits, 2)
}

/// "00000", "11111", ... are never real ZIP codes.
pub fn is_placeholder_zip(zip5: &str) -> bool {
    zip5.len() == 5 && is_repeated_digit_run(zip5, 5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_state_prefers_smallest_distance() {
        let candidates = [(0, "IN"), (4, "TX")];
        assert_eq!(nearest_state(&candidates, 5), Some((4, "TX")));
    }

    #[test]
    fn nearest_state_tie_goes_to_first() {
        let candidates = [(3, "AB"), (5, "CD")];
        assert_eq!(nearest_state(&candidates, 4), Some((3, "AB")));
    }

    #[test]
    fn nearest_state_empty() {
        assert_eq!(nearest_state(&[], 2), None);
    }

    #[test]
    fn repeated_digit_runs() {
        assert!(is_placeholder_house_number("11111"));
        assert!(is_placeholder_house_number("99"));
        assert!(!is_placeholder_house_number("7"));
        assert!(!is_placeholder_house_number("1121"));
        assert!(is_placeholder_zip("00000"));
        assert!(!is_placeholder_zip("90210"));
        assert!(!is_placeholder_zip("1111"));
        assert!(!is_repeated_digit_run("aaaa", 2));
        assert!(!is_repeated_digit_run("", 1));
    }
}
