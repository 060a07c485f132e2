use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error in a field registry.
    RegistryParse(String),
    /// Registry validation error (no fields, bad provider reference, etc.).
    RegistryValidation(String),
    /// The same canonical field name is declared twice.
    DuplicateField(String),
    /// Provider count outside the supported range.
    ProviderCount { found: usize, max: usize },
    /// Every provider returned an empty record.
    NoData,
    /// Providers returned records, but none carries a property marker key.
    NoPropertyData,
    /// Provider payload is not a JSON object.
    NotAnObject { provider: String },
    /// A provider id that the registry does not declare.
    UnknownProvider(String),
    /// IO / serialization error (CSV or JSON export, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryParse(msg) => write!(f, "registry parse error: {msg}"),
            Self::RegistryValidation(msg) => write!(f, "registry validation error: {msg}"),
            Self::DuplicateField(name) => write!(f, "duplicate canonical field: '{name}'"),
            Self::ProviderCount { found, max } => {
                write!(f, "registry must declare 1 to {max} provider(s), found {found}")
            }
            Self::NoData => write!(f, "no data found from any provider"),
            Self::NoPropertyData => write!(f, "no valid property data found"),
            Self::NotAnObject { provider } => {
                write!(f, "provider '{provider}': payload is not a JSON object")
            }
            Self::UnknownProvider(id) => write!(f, "unknown provider: '{id}'"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
