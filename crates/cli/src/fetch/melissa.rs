//! Melissa LookupProperty by free-form address.

use super::common::{extract_error_message, payload_at, FetchClient, FetchError};
use super::PropertySource;

pub struct MelissaSource {
    client: FetchClient,
    license: String,
    base_url: String,
}

impl MelissaSource {
    pub fn new(license: String, base_url: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Ok(Self {
            client: FetchClient::new("Melissa", timeout_secs, extract_error_message)?,
            license,
            base_url,
        })
    }
}

impl PropertySource for MelissaSource {
    fn id(&self) -> &str {
        "melissa"
    }

    fn fetch(&self, address: &str) -> Result<serde_json::Value, FetchError> {
        let body = self.client.request_with_retry(|http| {
            http.get(&self.base_url).query(&[
                ("id", self.license.as_str()),
                ("ff", address),
                ("format", "json"),
            ])
        })?;
        Ok(payload_at(&body, &["Records", "0"]))
    }
}
