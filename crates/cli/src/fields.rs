//! `pcheck fields`: inspect or check a field registry.

use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use parcelcheck_config::Settings;
use parcelcheck_recon::{FieldRegistry, ReconError};

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::{load_registry, CliError};

#[derive(Subcommand)]
pub enum FieldsCommands {
    /// List canonical fields and their provider keys
    #[command(after_help = "\
Examples:
  pcheck fields list
  pcheck fields list --section 'Owner info'
  pcheck fields list --registry my-fields.toml --json")]
    List {
        /// Only fields in this section (case-insensitive)
        #[arg(long)]
        section: Option<String>,

        /// Field registry TOML (default: settings, then the built-in registry)
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check that a registry file parses and is consistent (exit 6 if not)
    #[command(after_help = "\
Examples:
  pcheck fields check my-fields.toml")]
    Check {
        /// Path to the registry TOML
        path: PathBuf,
    },
}

pub fn cmd_fields(settings: &Settings, cmd: FieldsCommands) -> Result<(), CliError> {
    match cmd {
        FieldsCommands::List { section, registry, json } => {
            let registry = load_registry(registry.as_deref(), settings)?;
            cmd_fields_list(&registry, section.as_deref(), json)
        }
        FieldsCommands::Check { path } => cmd_fields_check(path),
    }
}

fn cmd_fields_list(registry: &FieldRegistry, section: Option<&str>, json: bool) -> Result<(), CliError> {
    let ids: Vec<&str> = registry.providers().iter().map(|p| p.id.as_str()).collect();
    let selected: Vec<_> = registry
        .fields()
        .iter()
        .filter(|f| match section {
            Some(s) => f.section.as_deref().is_some_and(|fs| fs.eq_ignore_ascii_case(s)),
            None => true,
        })
        .collect();

    if selected.is_empty() {
        if let Some(s) = section {
            return Err(CliError::args(format!("no fields in section \"{s}\""))
                .with_hint(format!("sections: {}", registry.sections().join(", "))));
        }
    }

    if json {
        let rows: Vec<_> = selected
            .iter()
            .map(|f| {
                let sources: serde_json::Map<String, serde_json::Value> = ids
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, id)| f.source_key(slot).map(|k| (id.to_string(), json!(k))))
                    .collect();
                json!({ "name": f.name, "section": f.section, "sources": sources })
            })
            .collect();
        let text = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let name_width = selected.iter().map(|f| f.name.len()).max().unwrap_or(0).max(5);
    let mut header = format!("{:<name_width$}", "FIELD");
    for id in &ids {
        header.push_str(&format!("  {:<28}", id.to_uppercase()));
    }
    println!("{}", header.trim_end());

    let mut current_section: Option<&str> = None;
    for f in &selected {
        if section.is_none() && f.section.as_deref() != current_section {
            current_section = f.section.as_deref();
            if let Some(s) = current_section {
                println!("# {s}");
            }
        }
        let mut line = format!("{:<name_width$}", f.name);
        for slot in 0..ids.len() {
            line.push_str(&format!("  {:<28}", f.source_key(slot).unwrap_or("-")));
        }
        println!("{}", line.trim_end());
    }
    eprintln!("{} of {} field(s)", selected.len(), registry.len());
    Ok(())
}

fn cmd_fields_check(path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;

    let registry = FieldRegistry::from_toml(&text).map_err(|e: ReconError| {
        CliError::new(EXIT_INVALID_CONFIG, format!("{}: {e}", path.display()))
    })?;

    let mapped: Vec<String> = registry
        .providers()
        .iter()
        .enumerate()
        .map(|(slot, p)| {
            let count = registry.fields().iter().filter(|f| f.source_key(slot).is_some()).count();
            format!("{} {count}", p.label())
        })
        .collect();

    println!(
        "ok: '{}': {} field(s), {} section(s); mapped per provider: {}",
        registry.name(),
        registry.len(),
        registry.sections().len(),
        mapped.join(", "),
    );
    Ok(())
}
