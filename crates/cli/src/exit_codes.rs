//! Exit codes for `pcheck`.
//!
//! Scripts branch on these, so a code never changes meaning once released.
//!
//! | Code  | Meaning                                             |
//! |-------|-----------------------------------------------------|
//! | 0     | Success                                             |
//! | 1     | Unspecified failure                                 |
//! | 2     | Usage error (bad arguments, unknown provider)       |
//! | 3-7   | Address gate, reconciliation, registry and file IO  |
//! | 50-54 | Provider fetch failures (`pcheck fetch`)            |

// =============================================================================
// Universal (0-2)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure. No command currently exits with it.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Lookup and reconciliation (3-7)
// =============================================================================

/// Address rejected by validation. No provider was called.
pub const EXIT_ADDRESS_REJECTED: u8 = 3;

/// No provider returned usable property data.
pub const EXIT_NO_DATA: u8 = 4;

/// Discrepancies found and `--fail-on-discrepancy` is set.
pub const EXIT_DISCREPANCIES: u8 = 5;

/// Field registry or settings file is invalid.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Cannot read/write a file, or an input file does not parse.
pub const EXIT_IO: u8 = 7;

// =============================================================================
// Fetch (50-54)
// =============================================================================

/// No credentials provided (neither flag, keychain nor env var).
pub const EXIT_FETCH_NOT_AUTH: u8 = 50;

/// Auth rejected by upstream (401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx, other 4xx, unreadable body) or network failure
/// after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;
