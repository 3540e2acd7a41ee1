use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    config::Config,
    generate_cmd::{load_schema, resolve_options},
    generator::RowGenerator,
    schema::InferredType,
    table::{self, Align},
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let config = Config::load_or_default(args.config.as_deref())?;
    let options = resolve_options(config.generate, args.numeric_model);
    let schema = load_schema(&args.schema)?;
    let generator = RowGenerator::new(&schema, options)
        .with_context(|| format!("Preparing generator for {:?}", args.schema))?;

    let rows = generator
        .preview(args.seed)
        .into_iter()
        .map(|row| row.iter().map(|value| value.as_display()).collect())
        .collect::<Vec<Vec<String>>>();
    let align = schema
        .columns
        .iter()
        .map(|column| match column.inferred_type() {
            InferredType::Numeric => Align::Right,
            _ => Align::Left,
        })
        .collect::<Vec<_>>();

    table::print_table(&schema.headers(), &align, &rows);
    info!(
        "Previewed {} synthetic row(s) from {:?} with seed {}",
        rows.len(),
        args.schema,
        args.seed
    );
    Ok(())
}
