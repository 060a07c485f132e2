//! `pcheck compare` / `lookup` / `fetch` / `select`: reconcile property
//! data across providers and render the report.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{ArgGroup, Args};
use serde::Serialize;

use parcelcheck_config::Settings;
use parcelcheck_recon::export::write_comparison_csv;
use parcelcheck_recon::selection::SelectionExport;
use parcelcheck_recon::{
    flatten_payload, normalize, reconcile, select_by_preference, select_explicit, validate,
    FieldRegistry, FlatRecord, LookupReport, SelectionSet,
};

use crate::exit_codes::EXIT_DISCREPANCIES;
use crate::fetch::{self, CredentialFlags};
use crate::{load_registry, write_output, CliError, RenderArgs};

// ============================================================================
// compare
// ============================================================================

/// Split `provider=path`.
fn parse_input(input: &str) -> Result<(&str, PathBuf), CliError> {
    match input.split_once('=') {
        Some((provider, path)) if !provider.trim().is_empty() && !path.trim().is_empty() => {
            Ok((provider.trim(), PathBuf::from(path.trim())))
        }
        _ => Err(CliError::args(format!("invalid --input \"{input}\""))
            .with_hint("expected PROVIDER=PATH, e.g. regrid=regrid.json")),
    }
}

pub fn cmd_compare(
    settings: &Settings,
    inputs: Vec<String>,
    address: Option<String>,
    registry_path: Option<PathBuf>,
    render: RenderArgs,
) -> Result<(), CliError> {
    let registry = load_registry(registry_path.as_deref(), settings)?;
    let mut records = vec![FlatRecord::new(); registry.providers().len()];
    let mut seen = vec![false; records.len()];

    for input in &inputs {
        let (provider, path) = parse_input(input)?;
        let slot = registry.provider_slot(provider).ok_or_else(|| {
            CliError::args(format!("unknown provider \"{provider}\" in --input"))
                .with_hint(format!("registry providers: {}", provider_ids(&registry).join(", ")))
        })?;
        if std::mem::replace(&mut seen[slot], true) {
            return Err(CliError::args(format!("provider \"{provider}\" given more than once")));
        }

        let text = std::fs::read_to_string(&path)
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
        let payload: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| CliError::io(format!("invalid JSON in {}: {e}", path.display())))?;
        records[slot] = flatten_payload(provider, &payload, &settings.separator)?;
        log::info!("{provider}: {} key(s) from {}", records[slot].len(), path.display());
    }

    let address = address.map(|a| normalize(&a)).unwrap_or_default();
    let report = reconcile(&registry, &address, &records)?;
    render_report(&report, None, &render)
}

fn provider_ids(registry: &FieldRegistry) -> Vec<&str> {
    registry.providers().iter().map(|p| p.id.as_str()).collect()
}

// ============================================================================
// lookup
// ============================================================================

pub fn cmd_lookup(
    settings: &Settings,
    address: &str,
    flags: CredentialFlags,
    render: RenderArgs,
    prefer: Vec<String>,
) -> Result<(), CliError> {
    // Gate first: a rejected address never reaches a provider
    let verdict = validate(address);
    if let Some(reason) = verdict.rejection() {
        return Err(CliError::rejected(reason.message())
            .with_hint(format!("normalized as: {}", verdict.normalized())));
    }
    let normalized = verdict.normalized().to_string();

    let registry = load_registry(None, settings)?;
    let ids = provider_ids(&registry);
    let sources = fetch::build_sources(&ids, settings, &flags);
    if sources.iter().all(Option::is_none) {
        log::warn!("no provider is configured; set credentials via flags or PARCELCHECK_* env vars");
    }

    let payloads = fetch::fetch_all(&sources, &normalized);
    let records: Vec<FlatRecord> = ids
        .iter()
        .zip(&payloads)
        .map(|(id, payload)| {
            flatten_payload(id, payload, &settings.separator).unwrap_or_else(|e| {
                log::warn!("{e}; treating as no data");
                FlatRecord::new()
            })
        })
        .collect();

    let report = reconcile(&registry, &normalized, &records)?;

    let selection = if prefer.is_empty() {
        None
    } else {
        let order: Vec<&str> = prefer.iter().map(String::as_str).collect();
        Some(select_by_preference(&report.comparison, &report.meta.providers, &order)?)
    };

    render_report(&report, selection.as_ref(), &render)
}

// ============================================================================
// fetch
// ============================================================================

pub fn cmd_fetch(
    settings: &Settings,
    provider: &str,
    address: &str,
    flags: CredentialFlags,
    raw: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let registry = load_registry(None, settings)?;
    let Some(slot) = registry.provider_slot(provider) else {
        return Err(CliError::args(format!("unknown provider \"{provider}\""))
            .with_hint(format!("registry providers: {}", provider_ids(&registry).join(", "))));
    };
    let id = registry.providers()[slot].id.as_str();

    let source = fetch::build_source(id, settings, &flags)?;
    let normalized = normalize(address);
    let payload = source.fetch(&normalized)?;

    let value = if raw {
        payload
    } else {
        let record = flatten_payload(id, &payload, &settings.separator)?;
        serde_json::to_value(&record)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?
    };

    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    write_output(output.as_deref(), &format!("{text}\n"))
}

// ============================================================================
// select
// ============================================================================

#[derive(Args)]
#[command(group(ArgGroup::new("mode").required(true).args(["prefer", "pick"])))]
pub struct SelectArgs {
    /// JSON report written by `lookup --json` or `compare --json`
    #[arg(long)]
    report: PathBuf,

    /// Take each field from the first provider in this order with a value
    #[arg(long, value_delimiter = ',', value_name = "PROVIDER,...")]
    prefer: Vec<String>,

    /// Take FIELD from PROVIDER (repeatable)
    #[arg(long, value_name = "FIELD=PROVIDER")]
    pick: Vec<String>,

    /// Output `Field Name,Provider,Value` CSV instead of JSON
    #[arg(long)]
    csv: bool,

    /// Write to file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

pub fn cmd_select(args: SelectArgs) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.report)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", args.report.display())))?;
    let report: LookupReport = serde_json::from_str(&text).map_err(|e| {
        CliError::io(format!("{} is not a lookup report: {e}", args.report.display()))
    })?;

    let set = if !args.prefer.is_empty() {
        let order: Vec<&str> = args.prefer.iter().map(String::as_str).collect();
        select_by_preference(&report.comparison, &report.meta.providers, &order)?
    } else {
        let picks = args
            .pick
            .iter()
            .map(|p| match p.split_once('=') {
                Some((field, provider)) => Ok((field.trim().to_string(), provider.trim().to_string())),
                None => Err(CliError::args(format!("invalid --pick \"{p}\""))
                    .with_hint("expected FIELD=PROVIDER, e.g. year_built=regrid")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (set, skipped) = select_explicit(&report.comparison, &report.meta.providers, &picks);
        if !skipped.is_empty() {
            eprintln!("{} pick(s) skipped", skipped.len());
        }
        set
    };

    eprintln!("selected {} field(s)", set.len());
    if args.csv {
        write_output(args.output.as_deref(), &selection_csv(&set)?)
    } else {
        let doc = set.export(&report.meta.address);
        write_output(args.output.as_deref(), &to_json(&doc)?)
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// `lookup --json` output: the report, plus the merged selection when one
/// was requested.
#[derive(Serialize)]
struct LookupOutput<'a> {
    #[serde(flatten)]
    report: &'a LookupReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection: Option<SelectionExport>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map(|s| s + "\n")
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

fn selection_csv(set: &SelectionSet) -> Result<String, CliError> {
    let mut buf = Vec::new();
    set.write_csv(&mut buf)?;
    String::from_utf8(buf).map_err(|e| CliError::io(format!("CSV encoding error: {e}")))
}

fn render_report(
    report: &LookupReport,
    selection: Option<&SelectionSet>,
    render: &RenderArgs,
) -> Result<(), CliError> {
    let content = if render.json {
        to_json(&LookupOutput {
            report,
            selection: selection.map(|s| s.export(&report.meta.address)),
        })?
    } else if render.csv {
        match selection {
            Some(set) => selection_csv(set)?,
            None => {
                let mut buf = Vec::new();
                write_comparison_csv(report, &mut buf)?;
                String::from_utf8(buf)
                    .map_err(|e| CliError::io(format!("CSV encoding error: {e}")))?
            }
        }
    } else {
        human_report(report, selection)
    };
    write_output(render.output.as_deref(), &content)?;

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "{} field(s): {} with data, {} discrepancies",
        s.fields, s.fields_with_data, s.discrepancies,
    );
    if !s.not_found.is_empty() {
        eprintln!("no data from: {}", s.not_found.join(", "));
    }

    if render.fail_on_discrepancy && s.discrepancies > 0 {
        return Err(CliError::new(
            EXIT_DISCREPANCIES,
            format!("{} discrepancies found", s.discrepancies),
        ));
    }
    Ok(())
}

fn human_report(report: &LookupReport, selection: Option<&SelectionSet>) -> String {
    let labels: Vec<&str> = report.meta.providers.iter().map(String::as_str).collect();
    let mut out = String::new();

    if !report.meta.address.is_empty() {
        let _ = writeln!(out, "Address: {}", report.meta.address);
    }
    let _ = writeln!(out, "Registry: {} ({} fields)", report.meta.registry, report.summary.fields);
    let _ = writeln!(out);

    let _ = writeln!(out, "Availability");
    for (label, p) in labels.iter().zip(&report.statistics.providers) {
        let _ = writeln!(
            out,
            "  {:<10} {:>4} / {:<4} {:>5.1}%",
            label,
            p.available,
            p.total,
            p.coverage_percent(),
        );
    }
    let _ = writeln!(out);

    if report.discrepancies.is_empty() {
        let _ = writeln!(out, "No discrepancies");
    } else {
        let _ = writeln!(out, "Discrepancies ({})", report.discrepancies.len());
        let width = report
            .discrepancies
            .iter()
            .map(|d| d.field_name.len())
            .max()
            .unwrap_or(0);
        for d in &report.discrepancies {
            let values: Vec<String> = labels
                .iter()
                .zip(&d.values)
                .filter(|(_, v)| !v.is_empty())
                .map(|(label, v)| format!("{label}: {v}"))
                .collect();
            let _ = writeln!(
                out,
                "  {:<width$}  {:<16}  {}",
                d.field_name,
                d.status.label(&labels),
                values.join(" | "),
            );
        }
    }

    if let Some(set) = selection {
        let _ = writeln!(out);
        let _ = writeln!(out, "Merged record ({} fields)", set.len());
        for s in set.iter() {
            let _ = writeln!(out, "  {} = {} ({})", s.field, s.value, s.provider);
        }
    }
    out
}
