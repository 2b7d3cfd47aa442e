//! I/O utilities for reading delimited catalogs.
//!
//! All file reads in fragrance-analytics flow through this module. It provides:
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to latin1
//!   (windows-1252).
//! - **Reader construction**: `open_csv_reader` builds a flexible reader; rows
//!   with a stray field count come back as records for the loader to skip.
//! - **Delimiter display** for log messages.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, WINDOWS_1252};

pub const DEFAULT_DELIMITER: u8 = b';';

pub fn default_encoding() -> &'static Encoding {
    WINDOWS_1252
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(default_encoding())
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    delimiter: u8,
) -> std::io::Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path)?;
    Ok(open_csv_reader(BufReader::new(file), delimiter))
}

/// Decodes raw bytes. Single-byte legacy encodings map every byte, so only
/// multi-byte encodings can report errors here.
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

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
