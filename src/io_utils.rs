//! CSV reading and writing, input decoding, and delimiter resolution.
//!
//! - **Delimiter resolution**: `.tsv` paths default to tab, everything else to
//!   comma, unless a delimiter is given explicitly.
//! - **Encoding**: input bytes are decoded with `encoding_rs`, UTF-8 unless
//!   `--input-encoding` names another label.
//! - **stdin/stdout**: a path of `-` reads standard input; a missing output
//!   path writes standard output.
//!
//! Readers are built `flexible` so that ragged rows reach the table builder,
//! which reports them with the offending row number.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| delimiter_for_extension(path).unwrap_or(DEFAULT_CSV_DELIMITER))
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    provided
        .or_else(|| path.and_then(delimiter_for_extension))
        .unwrap_or(DEFAULT_CSV_DELIMITER)
}

fn delimiter_for_extension(path: &Path) -> Option<u8> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Some(DEFAULT_TSV_DELIMITER),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(DEFAULT_CSV_DELIMITER),
        _ => None,
    }
}

/// Header handling is left to the caller: every record, including a
/// possible header row, comes back as data.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Every record of `reader`, decoded, in file order.
pub fn read_records<R>(reader: &mut csv::Reader<R>, encoding: &'static Encoding) -> Result<Vec<Vec<String>>>
where
    R: Read,
{
    let mut records = Vec::new();
    let mut record = csv::ByteRecord::new();
    while reader.read_byte_record(&mut record)? {
        let line = record.position().map_or(records.len() as u64 + 1, |pos| pos.line());
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding record on line {line}"))?;
        records.push(decoded);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(resolve_input_delimiter(Path::new("data.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("data.txt"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("data.tsv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(Some(Path::new("out.TSV")), None), b'\t');
        assert_eq!(resolve_output_delimiter(None, None), b',');
    }

    #[test]
    fn reader_keeps_ragged_records() {
        let mut reader = open_csv_reader("a,b\n1\n".as_bytes(), b',');
        let records = read_records(&mut reader, UTF_8).expect("records");
        assert_eq!(records, vec![vec!["a", "b"], vec!["1"]]);
    }

    #[test]
    fn latin1_input_decodes() {
        let encoding = resolve_encoding(Some("windows-1252")).expect("encoding");
        let mut reader = open_csv_reader(&b"caf\xe9\n"[..], b',');
        let records = read_records(&mut reader, encoding).expect("records");
        assert_eq!(records[0][0], "café");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
