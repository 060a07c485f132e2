//! Regrid parcel lookup by address.

use super::common::{extract_error_message, payload_at, FetchClient, FetchError};
use super::PropertySource;

pub struct RegridSource {
    client: FetchClient,
    token: String,
    base_url: String,
}

impl RegridSource {
    pub fn new(token: String, base_url: String, timeout_secs: u64) -> Result<Self, FetchError> {
        Ok(Self {
            client: FetchClient::new("Regrid", timeout_secs, extract_error_message)?,
            token,
            base_url,
        })
    }
}

impl PropertySource for RegridSource {
    fn id(&self) -> &str {
        "regrid"
    }

    fn fetch(&self, address: &str) -> Result<serde_json::Value, FetchError> {
        let body = self.client.request_with_retry(|http| {
            http.get(&self.base_url)
                .header("accept", "application/json")
                .header("x-regrid-token", &self.token)
                .query(&[("query", address), ("limit", "1")])
        })?;
        Ok(payload_at(
            &body,
            &["parcels", "features", "0", "properties", "fields"],
        ))
    }
}
