use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ProfileArgs,
    config::{Config, InferenceConfig},
    dataset::{HeaderMode, RawTable},
    io_utils, printable_delimiter,
    schema::{ColumnStatistics, Schema, SchemaBuilder},
    table::{self, Align},
};

pub fn execute(args: &ProfileArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Profiling '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );

    let mode = HeaderMode::from_flags(args.header, args.no_header);
    let schema = profile_path(&args.input, delimiter, encoding, mode, config.inference)?;
    info!(
        "Profiled {} row(s) across {} column(s) (header {})",
        schema.row_count,
        schema.columns.len(),
        if schema.source_had_header { "present" } else { "absent" }
    );

    match &args.schema {
        Some(path) => {
            schema.save(path)?;
            info!("Schema written to {path:?}");
            print_summary(&schema);
        }
        None => println!("{}", schema.to_json_string()?),
    }
    Ok(())
}

/// Reads, shapes and profiles one CSV file.
pub fn profile_path(
    path: &Path,
    delimiter: u8,
    encoding: &'static encoding_rs::Encoding,
    mode: HeaderMode,
    inference: InferenceConfig,
) -> Result<Schema> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let records = io_utils::read_records(&mut reader, encoding)
        .with_context(|| format!("Reading {path:?}"))?;
    let table = RawTable::from_records(records, mode, &inference)
        .with_context(|| format!("Shaping {path:?} into columns"))?;
    let schema = SchemaBuilder::new(inference)
        .build_table(&table)
        .with_context(|| format!("Profiling {path:?}"))?;
    Ok(schema)
}

fn print_summary(schema: &Schema) {
    let headers = ["column", "type", "null_rate", "summary"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = schema
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.inferred_type().to_string(),
                format!("{:.3}", column.null_rate),
                summarize(&column.statistics, column.degenerate),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &[Align::Left, Align::Left, Align::Right], &rows);
}

fn summarize(statistics: &ColumnStatistics, degenerate: bool) -> String {
    if degenerate {
        return "no values (always missing)".to_string();
    }
    match statistics {
        ColumnStatistics::Numeric(stats) => format!(
            "min {} max {} mean {:.3} sd {:.3}",
            stats.min, stats.max, stats.mean, stats.std_dev
        ),
        ColumnStatistics::Datetime(stats) => format!(
            "{} .. {} ({})",
            crate::data::render_epoch(stats.min, &stats.format).unwrap_or_default(),
            crate::data::render_epoch(stats.max, &stats.format).unwrap_or_default(),
            stats.format
        ),
        ColumnStatistics::Categorical(stats) => {
            format!("{} categories", stats.frequencies.len())
        }
        ColumnStatistics::Text(stats) => format!(
            "length {}..{} (mean {:.1}){}",
            stats.min_length,
            stats.max_length,
            stats.mean_length,
            match (&stats.frequencies, stats.values.len()) {
                (Some(table), _) => format!(", {} distinct", table.len()),
                (None, 0) => String::new(),
                (None, kept) => format!(", {kept} sampled values"),
            }
        ),
    }
}
