// Provider credentials
//
// Resolved from, in order:
// 1. System keychain (when built with the `keychain` feature)
// 2. Environment variables (PARCELCHECK_<PROVIDER>_<FIELD>)
//
// Credentials are NEVER stored in settings.toml

use std::env;

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "parcelcheck";

/// Where a credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed explicitly (command-line flag)
    Explicit,
    /// Retrieved from system keychain
    Keychain,
    /// Retrieved from environment variable
    Environment,
    /// Not found
    None,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "flag",
            Self::Keychain => "keychain",
            Self::Environment => "environment",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialLookup {
    pub value: Option<String>,
    pub source: CredentialSource,
}

impl CredentialLookup {
    fn found(value: String, source: CredentialSource) -> Self {
        Self {
            value: Some(value),
            source,
        }
    }
}

/// Environment variable for a provider credential, e.g.
/// `PARCELCHECK_SMARTY_AUTH_ID` for (`smarty`, `auth_id`).
pub fn env_var_name(provider: &str, field: &str) -> String {
    format!(
        "PARCELCHECK_{}_{}",
        provider.to_uppercase(),
        field.to_uppercase().replace('-', "_")
    )
}

#[cfg_attr(not(feature = "keychain"), allow(dead_code))]
fn keychain_account(provider: &str, field: &str) -> String {
    format!("{}/{}", provider.to_lowercase(), field.to_lowercase())
}

/// Look up a credential: keychain, then environment.
pub fn lookup(provider: &str, field: &str) -> CredentialLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider, field)) {
            if let Ok(value) = entry.get_password() {
                log::debug!("credential {provider}/{field} from keychain");
                return CredentialLookup::found(value, CredentialSource::Keychain);
            }
        }
    }

    let name = env_var_name(provider, field);
    if let Ok(value) = env::var(&name) {
        if !value.is_empty() {
            log::debug!("credential {provider}/{field} from {name}");
            return CredentialLookup::found(value, CredentialSource::Environment);
        }
    }

    CredentialLookup {
        value: None,
        source: CredentialSource::None,
    }
}

/// Resolve a credential, letting an explicit value win over stored ones.
pub fn resolve(explicit: Option<&str>, provider: &str, field: &str) -> CredentialLookup {
    match explicit {
        Some(v) if !v.is_empty() => CredentialLookup::found(v.to_string(), CredentialSource::Explicit),
        _ => lookup(provider, field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("regrid", "token"), "PARCELCHECK_REGRID_TOKEN");
        assert_eq!(env_var_name("smarty", "auth-id"), "PARCELCHECK_SMARTY_AUTH_ID");
        assert_eq!(env_var_name("Melissa", "license"), "PARCELCHECK_MELISSA_LICENSE");
    }

    #[test]
    fn test_keychain_account() {
        assert_eq!(keychain_account("Smarty", "AUTH_TOKEN"), "smarty/auth_token");
    }

    #[test]
    fn explicit_value_wins() {
        let found = resolve(Some("tok"), "regrid", "token");
        assert_eq!(found.value.as_deref(), Some("tok"));
        assert_eq!(found.source, CredentialSource::Explicit);
    }

    #[test]
    fn environment_fallback() {
        // Unique provider name keeps this independent of other tests and the keychain
        let name = env_var_name("pcheck-test-provider", "token");
        env::set_var(&name, "from-env");
        let found = resolve(None, "pcheck-test-provider", "token");
        env::remove_var(&name);

        assert_eq!(found.value.as_deref(), Some("from-env"));
        assert_eq!(found.source, CredentialSource::Environment);
    }

    #[test]
    fn empty_explicit_falls_through() {
        let found = resolve(Some(""), "pcheck-missing-provider", "token");
        assert!(found.value.is_none());
        assert_eq!(found.source, CredentialSource::None);
    }
}
