// Configuration loading

pub mod credentials;
pub mod error;
pub mod settings;

pub use credentials::{lookup, resolve, CredentialLookup, CredentialSource};
pub use error::ConfigError;
pub use settings::{ProviderSettings, Settings};
