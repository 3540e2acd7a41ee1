pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod generate_cmd;
pub mod generator;
pub mod io_utils;
pub mod preview;
pub mod profile_cmd;
pub mod profiler;
pub mod schema;
pub mod table;
pub mod validate_cmd;
pub mod validator;

pub use error::{Error, Result};
pub use generator::{RowGenerator, generate, preview};
pub use schema::{Schema, SchemaBuilder};
pub use validator::{ValidationReport, Violation, validate};

use std::{env, sync::OnceLock};

use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("datadepth", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => profile_cmd::execute(&args),
        Commands::Generate(args) => generate_cmd::execute(&args),
        Commands::Validate(args) => validate_cmd::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
