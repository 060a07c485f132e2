//! Property data providers.
//!
//! `pcheck lookup` calls every enabled provider concurrently and treats any
//! failure as "no data" for that provider. `pcheck fetch` calls one provider
//! and surfaces its errors.

mod common;
mod melissa;
mod regrid;
mod smarty;

use std::thread;

use parcelcheck_config::settings::{Settings, MELISSA, REGRID, SMARTY};
use parcelcheck_config::{credentials, CredentialSource};

pub use common::{FetchError, FetchErrorKind};
pub use melissa::MelissaSource;
pub use regrid::RegridSource;
pub use smarty::SmartySource;

/// A provider that can be asked for the raw property payload of an address.
pub trait PropertySource: Send + Sync {
    /// Registry provider id (`regrid`, `smarty`, `melissa`).
    fn id(&self) -> &str;

    /// Fetch the unwrapped property object. A provider that knows nothing
    /// about the address returns an empty object, not an error.
    fn fetch(&self, address: &str) -> Result<serde_json::Value, FetchError>;
}

/// Credential values passed on the command line. Missing values are
/// looked up in the keychain, then the environment.
#[derive(Debug, Clone, Default)]
pub struct CredentialFlags {
    pub regrid_token: Option<String>,
    pub smarty_auth_id: Option<String>,
    pub smarty_auth_token: Option<String>,
    pub melissa_license: Option<String>,
}

fn credential(explicit: &Option<String>, provider: &str, field: &str) -> Option<String> {
    let found = credentials::resolve(explicit.as_deref(), provider, field);
    if found.source != CredentialSource::None {
        log::debug!("{provider} {field}: from {}", found.source.as_str());
    }
    found.value
}

/// Build the adapter for one provider id from settings and credentials.
pub fn build_source(
    id: &str,
    settings: &Settings,
    flags: &CredentialFlags,
) -> Result<Box<dyn PropertySource>, FetchError> {
    let Some(provider) = settings.providers.resolve(id) else {
        return Err(FetchError::new(
            FetchErrorKind::Upstream,
            format!("no fetch adapter for provider '{id}'"),
        ));
    };

    let env = credentials::env_var_name;
    let source: Box<dyn PropertySource> = match provider.id {
        REGRID => Box::new(RegridSource::new(
            common::require(
                credential(&flags.regrid_token, REGRID, "token"),
                "Regrid",
                "--regrid-token",
                &env(REGRID, "token"),
            )?,
            provider.base_url,
            provider.timeout_secs,
        )?),
        SMARTY => Box::new(SmartySource::new(
            common::require(
                credential(&flags.smarty_auth_id, SMARTY, "auth_id"),
                "Smarty",
                "--smarty-auth-id",
                &env(SMARTY, "auth_id"),
            )?,
            common::require(
                credential(&flags.smarty_auth_token, SMARTY, "auth_token"),
                "Smarty",
                "--smarty-auth-token",
                &env(SMARTY, "auth_token"),
            )?,
            provider.base_url,
            provider.timeout_secs,
        )?),
        MELISSA => Box::new(MelissaSource::new(
            common::require(
                credential(&flags.melissa_license, MELISSA, "license"),
                "Melissa",
                "--melissa-license",
                &env(MELISSA, "license"),
            )?,
            provider.base_url,
            provider.timeout_secs,
        )?),
        other => {
            return Err(FetchError::new(
                FetchErrorKind::Upstream,
                format!("no fetch adapter for provider '{other}'"),
            ))
        }
    };
    Ok(source)
}

/// One adapter per registry provider slot. Slots whose provider is
/// disabled, unknown, or missing credentials are `None` and read as empty.
pub fn build_sources(
    provider_ids: &[&str],
    settings: &Settings,
    flags: &CredentialFlags,
) -> Vec<Option<Box<dyn PropertySource>>> {
    provider_ids
        .iter()
        .map(|id| {
            let enabled = settings.providers.resolve(id).map(|p| p.enabled).unwrap_or(true);
            if !enabled {
                log::info!("{id}: disabled in settings, skipping");
                return None;
            }
            match build_source(id, settings, flags) {
                Ok(source) => Some(source),
                Err(e) => {
                    log::warn!("{id}: {e}; treating as no data");
                    None
                }
            }
        })
        .collect()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Fetch, logging any failure and returning an empty object instead.
pub fn fetch_or_empty(source: &dyn PropertySource, address: &str) -> serde_json::Value {
    match source.fetch(address) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("{}: {e}; treating as no data", source.id());
            empty_object()
        }
    }
}

/// Query every source concurrently. The result follows slot order; absent
/// sources and failures come back as empty objects.
pub fn fetch_all(sources: &[Option<Box<dyn PropertySource>>], address: &str) -> Vec<serde_json::Value> {
    thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .map(|slot| {
                slot.as_deref()
                    .map(|source| scope.spawn(move || fetch_or_empty(source, address)))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle {
                Some(h) => h.join().unwrap_or_else(|_| {
                    log::warn!("provider thread panicked; treating as no data");
                    empty_object()
                }),
                None => empty_object(),
            })
            .collect()
    })
}
