//! In-memory catalog table.
//!
//! A [`Table`] owns an ordered list of rows sharing one column layout. It is
//! built once by the loader and only ever read afterwards: filtering and
//! projection produce new tables and leave the source untouched.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    data::Cell,
    error::QueryError,
    schema::{ColumnKind, DatasetSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(skip)]
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&Cell::Missing)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, QueryError> {
        self.column_index(name)
            .ok_or_else(|| QueryError::UnknownColumn(name.to_string()))
    }

    pub fn require_numeric(&self, name: &str) -> Result<usize, QueryError> {
        let index = self.require_column(name)?;
        if self.columns[index].kind == ColumnKind::Numeric {
            Ok(index)
        } else {
            Err(QueryError::NotNumeric(name.to_string()))
        }
    }

    /// Iterates the cells of one column in row order.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| row.cell(index))
    }

    /// Sorted distinct non-missing values of a column. Unknown columns have an
    /// empty domain.
    pub fn domain(&self, name: &str) -> Vec<String> {
        let Some(index) = self.column_index(name) else {
            return Vec::new();
        };
        self.column_cells(index)
            .filter_map(Cell::key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn distinct_count(&self, name: &str) -> usize {
        self.domain(name).len()
    }

    /// Copies the rows at `indices`, in the order given.
    pub fn subset(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&idx| self.rows.get(idx).cloned())
                .collect(),
        }
    }

    /// Restricts the table to the named columns, in the order given.
    pub fn project(&self, names: &[String]) -> Result<Table, QueryError> {
        let indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let columns = indices.iter().map(|&idx| self.columns[idx].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| Row::new(indices.iter().map(|&idx| row.cell(idx).clone()).collect()))
            .collect();
        Ok(Table { columns, rows })
    }

    pub fn record<'a>(&'a self, index: usize, schema: &'a DatasetSchema) -> Option<Record<'a>> {
        self.rows.get(index).map(|row| Record {
            table: self,
            row,
            schema,
        })
    }

    pub fn records<'a>(&'a self, schema: &'a DatasetSchema) -> impl Iterator<Item = Record<'a>> {
        self.rows.iter().map(move |row| Record {
            table: self,
            row,
            schema,
        })
    }

    /// Rows as display strings, for text rendering.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells().iter().map(|cell| cell.to_string()).collect())
            .collect()
    }
}

/// Typed view over one catalog row, resolved through a [`DatasetSchema`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a Table,
    row: &'a Row,
    schema: &'a DatasetSchema,
}

impl<'a> Record<'a> {
    fn cell(&self, column: &str) -> &'a Cell {
        match self.table.column_index(column) {
            Some(index) => self.row.cell(index),
            None => &Cell::Missing,
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        self.cell(&self.schema.name).as_text()
    }

    pub fn brand(&self) -> Option<&'a str> {
        self.cell(&self.schema.brand).as_text()
    }

    pub fn country(&self) -> Option<&'a str> {
        self.cell(&self.schema.country).as_text()
    }

    pub fn gender(&self) -> Option<&'a str> {
        self.cell(&self.schema.gender).as_text()
    }

    pub fn rating_value(&self) -> Option<f64> {
        self.cell(&self.schema.rating_value).as_number()
    }

    pub fn rating_count(&self) -> Option<u64> {
        self.cell(&self.schema.rating_count)
            .as_number()
            .filter(|count| *count >= 0.0)
            .map(|count| count as u64)
    }

    pub fn year(&self) -> Option<i32> {
        self.cell(&self.schema.year)
            .as_number()
            .map(|year| year as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec![
                Column {
                    name: "Brand".to_string(),
                    kind: ColumnKind::Text,
                },
                Column {
                    name: "Rating Value".to_string(),
                    kind: ColumnKind::Numeric,
                },
            ],
            vec![
                Row::new(vec![Cell::Text("Dior".into()), Cell::Number(4.1)]),
                Row::new(vec![Cell::Missing, Cell::Missing]),
                Row::new(vec![Cell::Text("Chanel".into()), Cell::Number(3.9)]),
                Row::new(vec![Cell::Text("Dior".into()), Cell::Number(4.4)]),
            ],
        )
    }

    #[test]
    fn domain_is_sorted_and_skips_missing() {
        assert_eq!(sample().domain("Brand"), vec!["Chanel", "Dior"]);
        assert!(sample().domain("Nope").is_empty());
    }

    #[test]
    fn subset_keeps_requested_order() {
        let table = sample();
        let subset = table.subset(&[3, 0, 99]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.rows()[0], table.rows()[3]);
        assert_eq!(subset.rows()[1], table.rows()[0]);
    }

    #[test]
    fn project_rejects_unknown_columns() {
        let err = sample().project(&["Year".to_string()]).unwrap_err();
        assert_eq!(err, QueryError::UnknownColumn("Year".to_string()));
    }

    #[test]
    fn require_numeric_checks_kind() {
        let table = sample();
        assert_eq!(table.require_numeric("Rating Value"), Ok(1));
        assert_eq!(
            table.require_numeric("Brand"),
            Err(QueryError::NotNumeric("Brand".to_string()))
        );
    }

    #[test]
    fn record_reads_roles_through_schema() {
        let table = sample();
        let schema = DatasetSchema::default();
        let record = table.record(0, &schema).expect("record");
        assert_eq!(record.brand(), Some("Dior"));
        assert_eq!(record.rating_value(), Some(4.1));
        assert_eq!(record.year(), None);
        assert_eq!(table.records(&schema).count(), 4);
    }
}
