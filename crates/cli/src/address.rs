//! `pcheck normalize` / `pcheck validate`.

use serde::Serialize;

use parcelcheck_recon::{normalize, validate, Rejection};

use crate::CliError;

pub fn cmd_normalize(address: &str) -> Result<(), CliError> {
    println!("{}", normalize(address));
    Ok(())
}

#[derive(Debug, Serialize)]
struct ValidateOutput<'a> {
    input: &'a str,
    normalized: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<Rejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

pub fn cmd_validate(address: &str, json: bool) -> Result<(), CliError> {
    let verdict = validate(address);
    let rejection = verdict.rejection();

    if json {
        let out = ValidateOutput {
            input: address,
            normalized: verdict.normalized(),
            valid: verdict.is_valid(),
            code: rejection,
            reason: rejection.map(|r| r.message()),
        };
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else if verdict.is_valid() {
        println!("{}", verdict.normalized());
    }

    match rejection {
        None => Ok(()),
        // Reason already on stdout in JSON mode
        Some(_) if json => Err(CliError::rejected("")),
        Some(reason) => Err(CliError::rejected(reason.message())
            .with_hint(format!("normalized as: {}", verdict.normalized()))),
    }
}
