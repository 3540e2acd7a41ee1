use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::ValidateArgs,
    error::Error,
    validator::{self, ValidationReport},
};

pub fn execute(args: &ValidateArgs) -> Result<()> {
    let report = check_file(&args.schema)?;
    if report.is_valid() {
        println!("{}: schema is valid", args.schema.display());
        return Ok(());
    }
    for violation in report.violations() {
        println!("{violation}");
    }
    bail!(
        "{:?} has {} violation(s)",
        args.schema,
        report.violations().len()
    )
}

/// Parses a schema document and runs every check on it. Only a document
/// that is not JSON at all is an error here.
pub fn check_file(path: &Path) -> Result<ValidationReport> {
    let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
    let document: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .map_err(Error::from)
        .with_context(|| format!("Parsing schema file {path:?}"))?;
    let report = validator::validate_document(&document);
    info!(
        "Checked {:?}: {} violation(s)",
        path,
        report.violations().len()
    );
    Ok(report)
}
