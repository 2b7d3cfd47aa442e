//! Summary statistics and rankings over a loaded table.
//!
//! Every computation skips missing cells. Statistics that cannot be computed from
//! the remaining values come back as `None`, which presentation code renders as
//! `N/A`; nothing here reports a missing value as zero.

use std::collections::HashMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{data::Cell, error::QueryError, schema::DatasetSchema, table::Table};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRank {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub total: usize,
    pub unique_brands: usize,
    pub average_rating: Option<f64>,
    pub countries: usize,
    pub filtered: usize,
}

#[derive(Debug, Default)]
struct ColumnStats {
    values: Vec<f64>,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStats {
    fn from_cells<'a>(cells: impl Iterator<Item = &'a Cell>) -> Self {
        let mut stats = Self::default();
        for value in cells.filter_map(Cell::as_number) {
            stats.add_value(value);
        }
        stats
    }

    fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.min = Some(self.min.map_or(value, |current| current.min(value)));
        self.max = Some(self.max.map_or(value, |current| current.max(value)));
        self.values.push(value);
    }

    fn count(&self) -> usize {
        self.values.len()
    }

    fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.sum / self.count() as f64)
        }
    }

    fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len().is_multiple_of(2) {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Sample standard deviation; needs at least two values.
    fn std_dev(&self) -> Option<f64> {
        if self.count() < 2 {
            return None;
        }
        let mean = self.mean()?;
        let squares = self
            .values
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>();
        Some((squares / (self.count() as f64 - 1.0)).sqrt())
    }

    fn summary(&self) -> Summary {
        Summary {
            count: self.count(),
            mean: self.mean(),
            median: self.median(),
            std_dev: self.std_dev(),
            min: self.min,
            max: self.max,
        }
    }
}

pub fn summarize(table: &Table, column: &str) -> Result<Summary, QueryError> {
    let index = table.require_numeric(column)?;
    Ok(ColumnStats::from_cells(table.column_cells(index)).summary())
}

/// Rows with the `n` largest values of `column`, projected to `select_columns`.
///
/// Rows where `column` is missing are left out entirely; equal values keep their
/// table order.
pub fn top_n(
    table: &Table,
    column: &str,
    n: usize,
    select_columns: &[String],
) -> Result<Table, QueryError> {
    let index = table.require_numeric(column)?;
    let ranked = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(row_idx, row)| row.cell(index).as_number().map(|value| (row_idx, value)))
        .sorted_by(|a, b| b.1.total_cmp(&a.1))
        .take(n)
        .map(|(row_idx, _)| row_idx)
        .collect::<Vec<_>>();
    table.subset(&ranked).project(select_columns)
}

/// Mean of `value_column` per `group_column` key, best mean first.
///
/// Only rows with both a group key and a value take part, so a group never
/// shows up without a mean. Equal means are ordered by key.
pub fn group_rank(
    table: &Table,
    group_column: &str,
    value_column: &str,
    n: usize,
) -> Result<Vec<GroupRank>, QueryError> {
    let group_index = table.require_column(group_column)?;
    let value_index = table.require_numeric(value_column)?;

    let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
    for row in table.rows() {
        let (Some(key), Some(value)) = (
            row.cell(group_index).key(),
            row.cell(value_index).as_number(),
        ) else {
            continue;
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sum, count))| GroupRank {
            key,
            mean: sum / count as f64,
            count,
        })
        .sorted_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| a.key.cmp(&b.key))
        })
        .take(n)
        .collect())
}

/// Occurrences of each non-missing value of `column`, most frequent first.
/// Equal counts keep the order in which values were first seen.
pub fn value_counts(table: &Table, column: &str, n: usize) -> Result<Vec<ValueCount>, QueryError> {
    let index = table.require_column(column)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<ValueCount> = Vec::new();
    for value in table.column_cells(index).filter_map(Cell::key) {
        match positions.get(&value) {
            Some(&position) => counts[position].count += 1,
            None => {
                positions.insert(value.clone(), counts.len());
                counts.push(ValueCount { value, count: 1 });
            }
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    Ok(counts)
}

/// Upper bound on the bin count accepted by [`histogram`].
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

/// Equal-width bins over the observed range of `column`. The last bin includes
/// its upper edge; a column with a single distinct value yields one bin.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Result<Vec<HistogramBin>, QueryError> {
    let index = table.require_numeric(column)?;
    if bins > MAX_HISTOGRAM_BINS {
        return Err(QueryError::TooManyBins {
            requested: bins,
            max: MAX_HISTOGRAM_BINS,
        });
    }
    let stats = ColumnStats::from_cells(table.column_cells(index));
    let (Some(min), Some(max)) = (stats.min, stats.max) else {
        return Ok(Vec::new());
    };
    if bins == 0 {
        return Ok(Vec::new());
    }
    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: stats.count(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut result = (0..bins)
        .map(|bin| HistogramBin {
            lower: min + width * bin as f64,
            upper: if bin + 1 == bins {
                max
            } else {
                min + width * (bin + 1) as f64
            },
            count: 0,
        })
        .collect::<Vec<_>>();
    for value in &stats.values {
        let bin = (((value - min) / width).floor() as usize).min(bins - 1);
        result[bin].count += 1;
    }
    Ok(result)
}

/// Headline figures: catalog size, brand and country counts and the average
/// rating of the full table, plus the size of the filtered view.
pub fn overview(full: &Table, filtered: &Table, schema: &DatasetSchema) -> Overview {
    let average_rating = full
        .column_index(&schema.rating_value)
        .and_then(|index| ColumnStats::from_cells(full.column_cells(index)).mean());
    Overview {
        total: full.len(),
        unique_brands: full.distinct_count(&schema.brand),
        average_rating,
        countries: full.distinct_count(&schema.country),
        filtered: filtered.len(),
    }
}
