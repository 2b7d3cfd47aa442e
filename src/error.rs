//! Error types surfaced by the analytic core.
//!
//! Only two conditions are real failures: the dataset cannot be found, or it is
//! present but cannot be parsed as a whole. Bad cells, bad rows, empty
//! selections and empty filter results are resolved inside the pipeline and never
//! reach these types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Dataset file '{}' not found.", .0.display())]
    NotFound(PathBuf),
    #[error("Error loading dataset: {0}")]
    Malformed(String),
}

impl LoadError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        LoadError::Malformed(reason.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

/// Caller mistakes when addressing a loaded table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Column '{0}' not found in dataset")]
    UnknownColumn(String),
    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("Histogram bin count {requested} exceeds the maximum of {max}")]
    TooManyBins { requested: usize, max: usize },
}
