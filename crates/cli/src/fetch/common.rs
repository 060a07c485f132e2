//! Shared infrastructure for property data adapters.
//!
//! Each adapter (regrid, smarty, melissa) reuses:
//! - `FetchClient`: HTTP client with retry, backoff and error classification
//! - `payload_at`: pull the property object out of a provider envelope

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::exit_codes;

// ── Constants ───────────────────────────────────────────────────────

pub(super) const MAX_RETRIES: u32 = 3;
pub(super) const USER_AGENT: &str = concat!("pcheck/", env!("CARGO_PKG_VERSION"));

// ── FetchError ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// No credentials were resolved for the provider.
    MissingCredentials,
    /// 401 / 403.
    Auth,
    /// 400.
    BadRequest,
    /// 429 after retries.
    RateLimited,
    /// 5xx / other 4xx / network / unreadable body.
    Upstream,
}

#[derive(Debug, Clone)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn exit_code(&self) -> u8 {
        match self.kind {
            FetchErrorKind::MissingCredentials => exit_codes::EXIT_FETCH_NOT_AUTH,
            FetchErrorKind::Auth => exit_codes::EXIT_FETCH_AUTH,
            FetchErrorKind::BadRequest => exit_codes::EXIT_FETCH_VALIDATION,
            FetchErrorKind::RateLimited => exit_codes::EXIT_FETCH_RATE_LIMIT,
            FetchErrorKind::Upstream => exit_codes::EXIT_FETCH_UPSTREAM,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchError {}

// ── FetchClient ─────────────────────────────────────────────────────

/// Shared HTTP client that handles retry, backoff, and error classification.
///
/// Adapters own their credentials, base URL, and query shape. They pass a
/// request-building closure to [`FetchClient::request_with_retry`] which
/// handles the retry loop and classifies HTTP failures.
pub(super) struct FetchClient {
    http: reqwest::blocking::Client,
    source_name: String,
    initial_backoff_secs: u64,
    error_extractor: fn(&serde_json::Value, u16) -> String,
}

impl FetchClient {
    pub(super) fn new(
        source_name: &str,
        timeout_secs: u64,
        error_extractor: fn(&serde_json::Value, u16) -> String,
    ) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                FetchError::new(
                    FetchErrorKind::Upstream,
                    format!("cannot build HTTP client for {source_name}: {e}"),
                )
            })?;

        Ok(Self {
            http,
            source_name: source_name.to_string(),
            initial_backoff_secs: 1,
            error_extractor,
        })
    }

    /// Override the first retry delay (doubles on each retry).
    #[cfg(test)]
    pub(super) fn with_backoff(mut self, secs: u64) -> Self {
        self.initial_backoff_secs = secs;
        self
    }

    /// Make a GET request with retry + exponential backoff.
    ///
    /// `build_request` is called once per attempt. It receives the
    /// underlying `reqwest::blocking::Client` and must return a fully
    /// configured `RequestBuilder` (URL, auth, headers, query params).
    pub(super) fn request_with_retry(
        &self,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, FetchError> {
        let mut backoff_secs = self.initial_backoff_secs;
        let name = &self.source_name;

        for attempt in 0..=MAX_RETRIES {
            let result = build_request(&self.http).send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Non-retryable client errors: fail immediately
                    if (400..500).contains(&status) && status != 429 {
                        let body: serde_json::Value =
                            resp.json().unwrap_or(serde_json::Value::Null);
                        let msg = (self.error_extractor)(&body, status);
                        return Err(match status {
                            401 | 403 => FetchError::new(
                                FetchErrorKind::Auth,
                                format!("{name} auth failed ({status}): {msg}"),
                            ),
                            400 => FetchError::new(
                                FetchErrorKind::BadRequest,
                                format!("{name} request rejected ({status}): {msg}"),
                            ),
                            _ => FetchError::new(
                                FetchErrorKind::Upstream,
                                format!("{name} error ({status}): {msg}"),
                            ),
                        });
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let (kind, what) = if status == 429 {
                                (FetchErrorKind::RateLimited, "rate limited")
                            } else {
                                (FetchErrorKind::Upstream, "upstream error")
                            };
                            return Err(FetchError::new(
                                kind,
                                format!("{name} {what} after {MAX_RETRIES} attempts ({status})"),
                            ));
                        }

                        // Respect Retry-After header for 429
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(backoff_secs)
                        } else {
                            backoff_secs
                        };

                        log::warn!(
                            "{name}: retry {}/{MAX_RETRIES} in {wait}s (HTTP {status})",
                            attempt + 1,
                        );
                        thread::sleep(Duration::from_secs(wait));
                        backoff_secs *= 2;
                        continue;
                    }

                    // Success: read as text first to tolerate a BOM prefix
                    let text = resp.text().map_err(|e| {
                        FetchError::new(
                            FetchErrorKind::Upstream,
                            format!("failed to read {name} response body: {e}"),
                        )
                    })?;
                    let trimmed = text.trim_start_matches('\u{feff}');
                    if trimmed.trim().is_empty() {
                        return Ok(serde_json::Value::Null);
                    }
                    return serde_json::from_str(trimmed).map_err(|e| {
                        FetchError::new(
                            FetchErrorKind::Upstream,
                            format!(
                                "failed to parse {name} JSON response: {e} (body: {})",
                                trimmed.chars().take(200).collect::<String>(),
                            ),
                        )
                    });
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == MAX_RETRIES {
                        return Err(FetchError::new(
                            FetchErrorKind::Upstream,
                            format!("{name} upstream error after {MAX_RETRIES} attempts: {e}"),
                        ));
                    }

                    log::warn!(
                        "{name}: retry {}/{MAX_RETRIES} in {backoff_secs}s ({e})",
                        attempt + 1,
                    );
                    thread::sleep(Duration::from_secs(backoff_secs));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Follow `path` into a provider envelope. Numeric segments index arrays.
///
/// Returns an empty object when any step is missing, so an envelope with
/// no matches reads as "no data" rather than an error.
pub(super) fn payload_at(body: &serde_json::Value, path: &[&str]) -> serde_json::Value {
    let mut current = body;
    for segment in path {
        let next = match segment.parse::<usize>() {
            Ok(index) => current.get(index),
            Err(_) => current.get(*segment),
        };
        match next {
            Some(v) => current = v,
            None => return serde_json::Value::Object(serde_json::Map::new()),
        }
    }
    current.clone()
}

/// Pull a message out of common JSON error bodies.
pub(super) fn extract_error_message(body: &serde_json::Value, status: u16) -> String {
    let candidates = [
        body.pointer("/message"),
        body.pointer("/error/message"),
        body.pointer("/error"),
        body.pointer("/errors/0/message"),
        body.pointer("/Message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}"))
}

/// Required credential, or `MissingCredentials` naming how to provide it.
pub(super) fn require(
    value: Option<String>,
    source_name: &str,
    flag: &str,
    env_var: &str,
) -> Result<String, FetchError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FetchError::new(
            FetchErrorKind::MissingCredentials,
            format!("missing {source_name} credentials (use {flag} or set {env_var})"),
        )),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
