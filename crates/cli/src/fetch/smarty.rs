//! Smarty US property enrichment (principal dataset).

use parcelcheck_recon::AddressParts;

use super::common::{extract_error_message, payload_at, FetchClient, FetchError};
use super::PropertySource;

pub struct SmartySource {
    client: FetchClient,
    auth_id: String,
    auth_token: String,
    base_url: String,
}

impl SmartySource {
    pub fn new(
        auth_id: String,
        auth_token: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            client: FetchClient::new("Smarty", timeout_secs, extract_error_message)?,
            auth_id,
            auth_token,
            base_url,
        })
    }
}

/// Query parameters for a normalized address. `zipcode` only when known.
fn address_params(address: &str) -> Vec<(&'static str, String)> {
    let parts = AddressParts::parse(address);
    let mut params = vec![
        ("street", parts.street.clone()),
        ("city", parts.city.clone()),
        ("state", parts.state.clone()),
    ];
    if !parts.zip.is_empty() {
        params.push(("zipcode", parts.zip5().to_string()));
    }
    params
}

impl PropertySource for SmartySource {
    fn id(&self) -> &str {
        "smarty"
    }

    fn fetch(&self, address: &str) -> Result<serde_json::Value, FetchError> {
        let params = address_params(address);
        let body = self.client.request_with_retry(|http| {
            http.get(&self.base_url)
                .query(&[("auth-id", &self.auth_id), ("auth-token", &self.auth_token)])
                .query(&params)
        })?;
        Ok(payload_at(&body, &["0", "attributes"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_address_params() {
        let params = address_params("436 Red River Trl #1112, Irving, TX 75063-1234");
        assert_eq!(
            params,
            vec![
                ("street", "436 Red River Trl #1112".to_string()),
                ("city", "Irving".to_string()),
                ("state", "TX".to_string()),
                ("zipcode", "75063".to_string()),
            ]
        );

        let params = address_params("12 Elm St, Springfield, IL");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn sends_auth_and_unwraps_attributes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/lookup/search/property/principal")
                .query_param("auth-id", "id1")
                .query_param("auth-token", "tok1")
                .query_param("street", "123 Main St")
                .query_param("city", "Anytown")
                .query_param("state", "CA")
                .query_param("zipcode", "90210");
            then.status(200).json_body(json!([
                { "smarty_key": "1", "attributes": { "year_built": "1998", "parcel_raw_number": "12345" } }
            ]));
        });

        let source = SmartySource::new(
            "id1".into(),
            "tok1".into(),
            server.url("/lookup/search/property/principal"),
            5,
        )
        .unwrap();
        let payload = source.fetch("123 Main St, Anytown, CA 90210").unwrap();

        mock.assert();
        assert_eq!(payload, json!({ "year_built": "1998", "parcel_raw_number": "12345" }));
    }

    #[test]
    fn empty_list_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/p");
            then.status(200).json_body(json!([]));
        });

        let source = SmartySource::new("id".into(), "tok".into(), server.url("/p"), 5).unwrap();
        assert_eq!(source.fetch("1 A St, B, CA 90210").unwrap(), json!({}));
    }
}
