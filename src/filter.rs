//! Categorical filtering by brand, country and gender.
//!
//! Two fallbacks shape every result and are part of the observable behaviour:
//!
//! - An empty selection for a dimension is replaced by the first K values of that
//!   column's sorted domain in the unfiltered table ([`DefaultLimits`]).
//! - A filter that matches no rows returns the whole unfiltered table, so
//!   downstream statistics never run on an empty set. [`FilterOutcome::fell_back`]
//!   tells callers when that happened.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    schema::{DatasetSchema, Dimension},
    table::Table,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub brand: BTreeSet<String>,
    pub country: BTreeSet<String>,
    pub gender: BTreeSet<String>,
}

impl Selections {
    pub fn get(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Brand => &self.brand,
            Dimension::Country => &self.country,
            Dimension::Gender => &self.gender,
        }
    }

    fn get_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Brand => &mut self.brand,
            Dimension::Country => &mut self.country,
            Dimension::Gender => &mut self.gender,
        }
    }

    pub fn with(mut self, dimension: Dimension, values: &[&str]) -> Self {
        self.get_mut(dimension)
            .extend(values.iter().map(|v| v.to_string()));
        self
    }
}

/// How many sorted domain values stand in for an empty selection. `None` takes
/// the whole domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLimits {
    pub brand: Option<usize>,
    pub country: Option<usize>,
    pub gender: Option<usize>,
}

impl Default for DefaultLimits {
    fn default() -> Self {
        Self {
            brand: Some(5),
            country: Some(10),
            gender: None,
        }
    }
}

impl DefaultLimits {
    pub fn get(&self, dimension: Dimension) -> Option<usize> {
        match dimension {
            Dimension::Brand => self.brand,
            Dimension::Country => self.country,
            Dimension::Gender => self.gender,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub column: String,
    pub selected: Vec<String>,
    pub defaulted: bool,
    pub domain_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub table: Table,
    /// Rows that matched before the empty-result fallback was considered.
    pub matched: usize,
    pub fell_back: bool,
    pub dimensions: Vec<DimensionReport>,
}

/// First `limit` values of the sorted domain of `column`.
pub fn default_selection(table: &Table, column: &str, limit: Option<usize>) -> BTreeSet<String> {
    let domain = table.domain(column);
    let take = limit.unwrap_or(domain.len());
    domain.into_iter().take(take).collect()
}

/// Replaces every empty dimension of `selections` with its default subset.
pub fn resolve_selections(
    table: &Table,
    schema: &DatasetSchema,
    selections: &Selections,
    limits: &DefaultLimits,
) -> (Selections, Vec<DimensionReport>) {
    let mut resolved = selections.clone();
    let mut reports = Vec::with_capacity(Dimension::ALL.len());
    for dimension in Dimension::ALL {
        let column = schema.dimension_column(dimension);
        let defaulted = selections.get(dimension).is_empty();
        if defaulted {
            *resolved.get_mut(dimension) =
                default_selection(table, column, limits.get(dimension));
            debug!(
                "No {} selected; defaulting to {:?}",
                dimension.label(),
                resolved.get(dimension)
            );
        }
        reports.push(DimensionReport {
            dimension,
            column: column.to_string(),
            selected: resolved.get(dimension).iter().cloned().collect(),
            defaulted,
            domain_size: table.distinct_count(column),
        });
    }
    (resolved, reports)
}

/// Filters `table` to rows whose brand, country and gender are all selected.
///
/// Empty selections are defaulted first (see [`resolve_selections`]). When no
/// row matches, the returned table is a copy of the unfiltered input and
/// `fell_back` is set.
pub fn apply(
    table: &Table,
    schema: &DatasetSchema,
    selections: &Selections,
    limits: &DefaultLimits,
) -> FilterOutcome {
    let (resolved, dimensions) = resolve_selections(table, schema, selections, limits);
    let checks = Dimension::ALL
        .iter()
        .map(|&dimension| {
            (
                table.column_index(schema.dimension_column(dimension)),
                resolved.get(dimension),
            )
        })
        .collect::<Vec<_>>();

    let indices = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            checks.iter().all(|(column, allowed)| {
                column
                    .and_then(|idx| row.cell(idx).key())
                    .is_some_and(|value| allowed.contains(&value))
            })
        })
        .map(|(idx, _)| idx)
        .collect::<Vec<_>>();

    let matched = indices.len();
    if matched == 0 {
        warn!(
            "Filter matched no rows; using all {} row(s) instead",
            table.len()
        );
        return FilterOutcome {
            table: table.clone(),
            matched,
            fell_back: true,
            dimensions,
        };
    }
    debug!("Filter matched {matched} of {} row(s)", table.len());
    FilterOutcome {
        table: table.subset(&indices),
        matched,
        fell_back: false,
        dimensions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::Cell,
        schema::ColumnKind,
        table::{Column, Row},
    };

    fn catalog(rows: &[(&str, &str, &str)]) -> Table {
        let columns = ["Brand", "Country", "Gender"]
            .iter()
            .map(|name| Column {
                name: name.to_string(),
                kind: ColumnKind::Text,
            })
            .collect();
        let rows = rows
            .iter()
            .map(|(b, c, g)| Row::new(vec![Cell::text(b), Cell::text(c), Cell::text(g)]))
            .collect();
        Table::new(columns, rows)
    }

    #[test]
    fn empty_brand_selection_takes_first_five_sorted() {
        let table = catalog(&[
            ("F", "France", "Men"),
            ("B", "France", "Men"),
            ("D", "Italy", "Women"),
            ("A", "France", "Men"),
            ("E", "France", "Men"),
            ("C", "France", "Men"),
        ]);
        let selections = Selections::default()
            .with(Dimension::Country, &["France"])
            .with(Dimension::Gender, &["Men"]);
        let (resolved, reports) = resolve_selections(
            &table,
            &DatasetSchema::default(),
            &selections,
            &DefaultLimits::default(),
        );
        let expected = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect::<BTreeSet<_>>();
        assert_eq!(resolved.brand, expected);
        assert!(reports[0].defaulted);
        assert!(!reports[1].defaulted);
        assert_eq!(reports[0].domain_size, 6);
    }

    #[test]
    fn filter_is_order_preserving_subsequence() {
        let table = catalog(&[
            ("A", "France", "Men"),
            ("B", "Italy", "Men"),
            ("A", "France", "Women"),
            ("A", "France", "Men"),
        ]);
        let selections = Selections::default()
            .with(Dimension::Brand, &["A"])
            .with(Dimension::Country, &["France"])
            .with(Dimension::Gender, &["Men"]);
        let outcome = apply(
            &table,
            &DatasetSchema::default(),
            &selections,
            &DefaultLimits::default(),
        );
        assert!(!outcome.fell_back);
        assert_eq!(outcome.table, table.subset(&[0, 3]));
    }

    #[test]
    fn no_match_falls_back_to_everything() {
        let table = catalog(&[("A", "France", "Men"), ("B", "Italy", "Women")]);
        let selections = Selections::default()
            .with(Dimension::Brand, &["A"])
            .with(Dimension::Country, &["Italy"]);
        let outcome = apply(
            &table,
            &DatasetSchema::default(),
            &selections,
            &DefaultLimits::default(),
        );
        assert!(outcome.fell_back);
        assert_eq!(outcome.matched, 0);
        assert_eq!(outcome.table, table);
    }

    #[test]
    fn missing_categorical_cells_never_match() {
        let table = catalog(&[("A", "", "Men"), ("A", "France", "Men")]);
        let outcome = apply(
            &table,
            &DatasetSchema::default(),
            &Selections::default(),
            &DefaultLimits::default(),
        );
        assert_eq!(outcome.table, table.subset(&[1]));
    }

    #[test]
    fn numeric_dimension_columns_match_their_domain() {
        let table = Table::new(
            vec![
                Column {
                    name: "Brand".to_string(),
                    kind: ColumnKind::Text,
                },
                Column {
                    name: "Country".to_string(),
                    kind: ColumnKind::Text,
                },
                Column {
                    name: "Year".to_string(),
                    kind: ColumnKind::Numeric,
                },
            ],
            vec![
                Row::new(vec![Cell::text("A"), Cell::text("X"), Cell::Number(2010.0)]),
                Row::new(vec![Cell::text("A"), Cell::text("X"), Cell::Number(2011.0)]),
                Row::new(vec![Cell::text("A"), Cell::text("X"), Cell::Missing]),
            ],
        );
        let schema = DatasetSchema {
            gender: "Year".to_string(),
            ..DatasetSchema::default()
        };

        let outcome = apply(&table, &schema, &Selections::default(), &DefaultLimits::default());
        assert!(!outcome.fell_back);
        assert_eq!(outcome.dimensions[2].selected, vec!["2010", "2011"]);
        assert_eq!(outcome.table, table.subset(&[0, 1]));

        let selections = Selections::default().with(Dimension::Gender, &["2011"]);
        let outcome = apply(&table, &schema, &selections, &DefaultLimits::default());
        assert_eq!(outcome.table, table.subset(&[1]));
    }

    #[test]
    fn unlimited_default_takes_whole_domain() {
        let table = catalog(&[("A", "X", "Men"), ("B", "Y", "Women"), ("C", "Z", "Unisex")]);
        let genders = default_selection(&table, "Gender", None);
        assert_eq!(genders.len(), 3);
        assert!(default_selection(&table, "Missing", Some(5)).is_empty());
    }
}
