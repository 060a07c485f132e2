use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file exists but cannot be read.
    Read { path: PathBuf, message: String },
    /// Settings file is not valid TOML for [`crate::Settings`].
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid settings in {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
