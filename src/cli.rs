use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::NumericModel;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Profile CSV data into a schema and generate synthetic look-alike rows",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a statistical schema from a CSV file
    #[command(alias = "prof")]
    Profile(ProfileArgs),
    /// Generate synthetic rows from a schema file
    #[command(alias = "gen")]
    Generate(GenerateArgs),
    /// Check a schema file and list every violation found
    Validate(ValidateArgs),
    /// Print five synthetic rows from a schema as a table
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Input CSV file to profile (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination schema file; the schema is printed to stdout when omitted
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Treat the first row as a header
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,
    /// Treat the first row as data and name columns col_0, col_1, ...
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding inference thresholds
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Schema file produced by `profile`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Number of rows to generate
    #[arg(short = 'n', long = "rows")]
    pub rows: usize,
    /// Output CSV file (defaults to stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Seed for the pseudo-random source
    #[arg(long, default_value_t = crate::generator::DEFAULT_SEED)]
    pub seed: u64,
    /// Numeric sampling model (overrides the config file)
    #[arg(long = "numeric-model", value_enum)]
    pub numeric_model: Option<NumericModel>,
    /// Output delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Omit the header row from the output
    #[arg(long = "no-header")]
    pub no_header: bool,
    /// YAML file with generation options
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Schema file to check
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Schema file produced by `profile`
    #[arg(short = 's', long = "schema")]
    pub schema: PathBuf,
    /// Seed for the pseudo-random source
    #[arg(long, default_value_t = crate::generator::DEFAULT_SEED)]
    pub seed: u64,
    /// Numeric sampling model (overrides the config file)
    #[arg(long = "numeric-model", value_enum)]
    pub numeric_model: Option<NumericModel>,
    /// YAML file with generation options
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err(format!("Delimiter '{other}' must be a single character"));
            }
            if !first.is_ascii() || first == '"' || first == '\n' {
                return Err(format!("Delimiter '{other}' is not usable in CSV"));
            }
            Ok(first as u8)
        }
    }
}
