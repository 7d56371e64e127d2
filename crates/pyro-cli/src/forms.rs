//! # Validate Subcommand
//!
//! Offline check of an application form file. The file holds one
//! `ApplicationForm` (JSON for `.json`, YAML otherwise) tagged by
//! `ApplicationType`, the same shape a saved draft has.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pyro_schema::ApplicationForm;

/// Arguments for `pyro validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Form file to check.
    pub form: PathBuf,
}

/// Read a form file.
pub fn load_form(path: &Path) -> Result<ApplicationForm> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading form {}", path.display()))?;
    let form = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON form {}", path.display()))?,
        _ => serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML form {}", path.display()))?,
    };
    Ok(form)
}

/// Exit code 0 when the form would be accepted, 1 with every field error
/// listed otherwise.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let form = load_form(&args.form)?;
    match form.validate() {
        Ok(()) => {
            println!("OK: {} form {} is valid", form.application_type(), args.form.display());
            Ok(0)
        }
        Err(errors) => {
            println!("FAIL: {}", args.form.display());
            println!("{errors}");
            Ok(1)
        }
    }
}
