use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};

use crate::{
    cli::GenerateArgs,
    config::{Config, GenerateOptions, NumericModel},
    error::Error,
    generator::RowGenerator,
    io_utils, printable_delimiter,
    schema::Schema,
};

pub fn execute(args: &GenerateArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let options = resolve_options(config.generate, args.numeric_model);
    let schema = load_schema(&args.schema)?;
    let generator = RowGenerator::new(&schema, options)
        .with_context(|| format!("Preparing generator for {:?}", args.schema))?;

    let delimiter = io_utils::resolve_output_delimiter(args.output.as_deref(), args.delimiter);
    info!(
        "Generating {} row(s) from {:?} with seed {} ({:?} numeric model, delimiter '{}')",
        args.rows,
        args.schema,
        args.seed,
        generator.options().numeric_model,
        printable_delimiter(delimiter)
    );

    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;
    if !args.no_header {
        writer
            .write_record(schema.headers())
            .context("Writing header row")?;
    }
    for (idx, row) in generator.rows(args.seed).take(args.rows).enumerate() {
        writer
            .write_record(row.iter().map(|value| value.as_display()))
            .with_context(|| format!("Writing generated row {}", idx + 1))?;
    }
    writer.flush().context("Flushing generated rows")?;

    if let Some(path) = &args.output {
        info!("Wrote {} row(s) to {path:?}", args.rows);
    }
    Ok(())
}

/// A command-line model choice wins over the config file.
pub(crate) fn resolve_options(
    mut options: GenerateOptions,
    numeric_model: Option<NumericModel>,
) -> GenerateOptions {
    if let Some(model) = numeric_model {
        options.numeric_model = model;
    }
    options
}

/// Loads a schema for sampling, logging each violation when it is refused.
pub(crate) fn load_schema(path: &Path) -> Result<Schema> {
    Schema::load(path).inspect_err(|err| {
        if let Some(Error::ValidationFailure(violations)) = err.downcast_ref::<Error>() {
            for violation in violations {
                error!("{violation}");
            }
        }
    })
}
