// parcelcheck CLI - address gate and multi-provider property reconciliation

mod address;
mod exit_codes;
mod fetch;
mod fields;
mod recon;

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use parcelcheck_config::{ConfigError, Settings};
use parcelcheck_recon::{FieldRegistry, ReconError};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_ADDRESS_REJECTED, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_NO_DATA, EXIT_SUCCESS,
    EXIT_USAGE,
};
use fetch::{CredentialFlags, FetchError};

#[derive(Parser)]
#[command(name = "pcheck")]
#[command(about = "Validate property addresses and reconcile property data across providers")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More logging on stderr (-v info, -vv debug). RUST_LOG also works.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: <config dir>/parcelcheck/settings.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized `Street, City, STATE ZIP` form of an address
    #[command(after_help = "\
Examples:
  pcheck normalize '519 Raton Pass Irving TX 75063 USA'
  pcheck normalize $'436 Red River Trl #1112\\tIrving\\t75063\\tTX'")]
    Normalize {
        /// Free-form address
        address: String,
    },

    /// Check an address against the pre-lookup gate (exit 3 when rejected)
    #[command(after_help = "\
Examples:
  pcheck validate '519 Raton Pass, Irving, TX 75063'
  pcheck validate 'Test Address 123' --json")]
    Validate {
        /// Free-form address
        address: String,

        /// Print the verdict as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Reconcile provider payloads saved as JSON files
    #[command(after_help = "\
Examples:
  pcheck compare --input regrid=regrid.json --input smarty=smarty.json
  pcheck compare --input regrid=r.json --input melissa=m.json --json --output report.json
  pcheck compare --input smarty=s.json --csv --fail-on-discrepancy")]
    Compare {
        /// Provider payload as PROVIDER=PATH (repeatable). Missing providers count as empty.
        #[arg(long = "input", value_name = "PROVIDER=PATH", required = true)]
        inputs: Vec<String>,

        /// Address the payloads belong to (recorded in the report)
        #[arg(long)]
        address: Option<String>,

        /// Field registry TOML (default: settings, then the built-in registry)
        #[arg(long)]
        registry: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Validate an address, query every provider, and reconcile the results
    #[command(after_help = "\
Examples:
  pcheck lookup '519 Raton Pass Irving TX 75063'
  pcheck lookup '519 Raton Pass, Irving, TX 75063' --json --output report.json
  pcheck lookup '519 Raton Pass, Irving, TX 75063' --prefer smarty,regrid,melissa
  PARCELCHECK_REGRID_TOKEN=... pcheck lookup '519 Raton Pass, Irving, TX 75063'")]
    Lookup {
        /// Free-form address
        address: String,

        #[command(flatten)]
        credentials: CredentialArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Also build a merged record, taking each field from the first
        /// provider in this order that has a value
        #[arg(long, value_delimiter = ',', value_name = "PROVIDER,...")]
        prefer: Vec<String>,
    },

    /// Fetch one provider's record for an address (errors are not softened)
    #[command(after_help = "\
Examples:
  pcheck fetch regrid '519 Raton Pass, Irving, TX 75063'
  pcheck fetch melissa '519 Raton Pass, Irving, TX 75063' --raw > melissa.json")]
    Fetch {
        /// Provider id (regrid, smarty, melissa)
        provider: String,

        /// Address (normalized before sending)
        address: String,

        #[command(flatten)]
        credentials: CredentialArgs,

        /// Print the unflattened payload (input for `pcheck compare`)
        #[arg(long)]
        raw: bool,

        /// Write to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Inspect or check a field registry
    #[command(subcommand)]
    Fields(fields::FieldsCommands),

    /// Build a merged record from a saved JSON report
    #[command(after_help = "\
Examples:
  pcheck select --report report.json --prefer regrid,smarty
  pcheck select --report report.json --pick year_built=melissa --pick owner_name=regrid
  pcheck select --report report.json --prefer melissa --csv --output selection.csv")]
    Select(recon::SelectArgs),
}

/// Output options shared by `compare` and `lookup`.
#[derive(Args)]
pub struct RenderArgs {
    /// Print the full report as JSON
    #[arg(long, conflicts_with = "csv")]
    pub json: bool,

    /// Print the comparison as CSV
    #[arg(long)]
    pub csv: bool,

    /// Write output to file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exit 5 when any discrepancy is found
    #[arg(long)]
    pub fail_on_discrepancy: bool,
}

/// Provider credentials. Each falls back to the keychain, then
/// PARCELCHECK_<PROVIDER>_<FIELD> in the environment.
#[derive(Args)]
pub struct CredentialArgs {
    /// Regrid API token (default: PARCELCHECK_REGRID_TOKEN)
    #[arg(long)]
    regrid_token: Option<String>,

    /// Smarty auth id (default: PARCELCHECK_SMARTY_AUTH_ID)
    #[arg(long)]
    smarty_auth_id: Option<String>,

    /// Smarty auth token (default: PARCELCHECK_SMARTY_AUTH_TOKEN)
    #[arg(long)]
    smarty_auth_token: Option<String>,

    /// Melissa license key (default: PARCELCHECK_MELISSA_LICENSE)
    #[arg(long)]
    melissa_license: Option<String>,
}

impl From<CredentialArgs> for CredentialFlags {
    fn from(args: CredentialArgs) -> Self {
        Self {
            regrid_token: args.regrid_token,
            smarty_auth_id: args.smarty_auth_id,
            smarty_auth_token: args.smarty_auth_token,
            melissa_license: args.melissa_license,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  parcelcheck-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        n => {
            let level = if n == 1 { "info" } else { "debug" };
            EnvFilter::new(format!(
                "warn,pcheck={level},parcelcheck_recon={level},parcelcheck_config={level}"
            ))
        }
    };
    // `log` records from every crate are bridged into the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = cli.settings;
    let result = match cli.command {
        Commands::Normalize { address } => address::cmd_normalize(&address),
        Commands::Validate { address, json } => address::cmd_validate(&address, json),
        Commands::Compare { inputs, address, registry, render } => {
            load_settings(settings_path.as_deref()).and_then(|settings| {
                recon::cmd_compare(&settings, inputs, address, registry, render)
            })
        }
        Commands::Lookup { address, credentials, render, prefer } => {
            load_settings(settings_path.as_deref()).and_then(|settings| {
                recon::cmd_lookup(&settings, &address, credentials.into(), render, prefer)
            })
        }
        Commands::Fetch { provider, address, credentials, raw, output } => {
            load_settings(settings_path.as_deref()).and_then(|settings| {
                recon::cmd_fetch(&settings, &provider, &address, credentials.into(), raw, output)
            })
        }
        Commands::Fields(cmd) => load_settings(settings_path.as_deref())
            .and_then(|settings| fields::cmd_fields(&settings, cmd)),
        Commands::Select(args) => recon::cmd_select(args),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Shared loading
// ============================================================================

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(p) => Ok(Settings::load_from(p)?),
        None => Ok(Settings::load()?),
    }
}

/// Registry from an explicit path, the settings file, or the built-in table.
pub fn load_registry(
    explicit: Option<&Path>,
    settings: &Settings,
) -> Result<Cow<'static, FieldRegistry>, CliError> {
    match explicit.or(settings.registry.as_deref()) {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::io(format!("cannot read registry {}: {e}", path.display()))
            })?;
            let registry = FieldRegistry::from_toml(&text)
                .map_err(|e| CliError::from(e).with_hint(format!("in {}", path.display())))?;
            log::info!("registry '{}' from {}", registry.name(), path.display());
            Ok(Cow::Owned(registry))
        }
        None => Ok(Cow::Borrowed(FieldRegistry::builtin()?)),
    }
}

/// Write to `output` (reporting the path on stderr) or stdout.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<(), CliError> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ADDRESS_REJECTED, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = match &err {
            ReconError::RegistryParse(_)
            | ReconError::RegistryValidation(_)
            | ReconError::DuplicateField(_)
            | ReconError::ProviderCount { .. } => EXIT_INVALID_CONFIG,
            ReconError::NoData | ReconError::NoPropertyData => EXIT_NO_DATA,
            ReconError::NotAnObject { .. } | ReconError::Io(_) => EXIT_IO,
            ReconError::UnknownProvider(_) => EXIT_USAGE,
        };
        Self::new(code, err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Read { .. } => EXIT_IO,
            ConfigError::Parse { .. } => EXIT_INVALID_CONFIG,
        };
        Self::new(code, err.to_string())
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        Self::new(err.exit_code(), err.message)
    }
}
