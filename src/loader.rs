//! Catalog ingestion.
//!
//! [`read_table`] turns a delimited file into a [`Table`]: headers are trimmed,
//! rows whose field count differs from the header are skipped, and the schema's
//! numeric columns are coerced cell by cell with unparsable cells kept as
//! [`Cell::Missing`]. [`DatasetLoader`] wraps it with an injected [`TableCache`]
//! so repeated loads of an unchanged file are served from memory.

use std::{collections::HashSet, path::Path, sync::Arc};

use encoding_rs::Encoding;
use log::{debug, info};

use crate::{
    cache::TableCache,
    data::{Cell, NumberStyle},
    error::LoadError,
    io_utils,
    schema::{ColumnKind, DatasetSchema},
    table::{Column, Row, Table},
};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub number_style: NumberStyle,
    pub schema: DatasetSchema,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: io_utils::DEFAULT_DELIMITER,
            encoding: io_utils::default_encoding(),
            number_style: NumberStyle::Standard,
            schema: DatasetSchema::default(),
        }
    }
}

/// Counters collected while reading a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub missing_numeric_cells: usize,
}

pub fn read_table(path: &Path, options: &LoadOptions) -> Result<Table, LoadError> {
    read_table_with_report(path, options).map(|(table, _)| table)
}

pub fn read_table_with_report(
    path: &Path,
    options: &LoadOptions,
) -> Result<(Table, LoadReport), LoadError> {
    let mut reader = io_utils::open_csv_reader_from_path(path, options.delimiter).map_err(|err| {
        match err.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::malformed(format!("Opening {path:?}: {err}")),
        }
    })?;

    let raw_headers = reader
        .byte_headers()
        .map_err(|err| LoadError::malformed(format!("Reading header row: {err}")))?
        .clone();
    if raw_headers.is_empty() {
        return Err(LoadError::malformed("No columns to parse from file"));
    }
    let headers = io_utils::decode_record(&raw_headers, options.encoding)
        .map_err(|err| LoadError::malformed(format!("Decoding header row: {err}")))?;
    let columns = build_columns(&headers, &options.schema)?;

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let line = row_idx + 2;
        let record =
            record.map_err(|err| LoadError::malformed(format!("Reading row {line}: {err}")))?;
        report.rows_read += 1;
        if record.len() != columns.len() {
            debug!(
                "Skipping row {line}: expected {} field(s), found {}",
                columns.len(),
                record.len()
            );
            report.rows_skipped += 1;
            continue;
        }
        let decoded = io_utils::decode_record(&record, options.encoding)
            .map_err(|err| LoadError::malformed(format!("Decoding row {line}: {err}")))?;
        let cells = columns
            .iter()
            .zip(decoded.iter())
            .map(|(column, raw)| match column.kind {
                ColumnKind::Numeric => {
                    let cell = Cell::numeric(raw, options.number_style);
                    if cell.is_missing() {
                        report.missing_numeric_cells += 1;
                    }
                    cell
                }
                ColumnKind::Text => Cell::text(raw),
            })
            .collect();
        rows.push(Row::new(cells));
    }

    info!(
        "Loaded {} row(s) across {} column(s) from {:?} ({} skipped, {} missing numeric cell(s))",
        rows.len(),
        columns.len(),
        path,
        report.rows_skipped,
        report.missing_numeric_cells
    );
    Ok((Table::new(columns, rows), report))
}

fn build_columns(headers: &[String], schema: &DatasetSchema) -> Result<Vec<Column>, LoadError> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .map(|header| {
            let name = header.trim().to_string();
            if !seen.insert(name.clone()) {
                return Err(LoadError::malformed(format!(
                    "Duplicate column '{name}' in header row"
                )));
            }
            let kind = schema.kind_of(&name);
            Ok(Column { name, kind })
        })
        .collect()
}

/// Loads catalogs through a cache so each unchanged source is parsed once.
pub struct DatasetLoader {
    options: LoadOptions,
    cache: TableCache,
}

impl DatasetLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self::with_cache(options, TableCache::new())
    }

    pub fn with_cache(options: LoadOptions, cache: TableCache) -> Self {
        Self { options, cache }
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.options.schema
    }

    pub fn cache(&self) -> &TableCache {
        &self.cache
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<Table>, LoadError> {
        self.cache.get_or_load(path, &self.options, read_table)
    }
}
