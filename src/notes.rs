//! Token frequencies for the olfactory note columns.
//!
//! Note cells hold whitespace-separated tokens. Tokens are compared exactly as
//! written: no case folding, punctuation stripping or stemming, so `Vanilla` and
//! `vanilla` count separately. Comma or slash separated notes are not split
//! either.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    schema::{DatasetSchema, NoteLayer},
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCount {
    pub token: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRanking {
    pub layer: NoteLayer,
    pub column: String,
    pub tokens: Vec<TokenCount>,
}

/// Token counts for one column, in first-occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<TokenCount>,
}

impl FrequencyTable {
    /// Counts every token of `column` across all rows. A column the table does
    /// not have produces an empty frequency table.
    pub fn from_column(table: &Table, column: &str) -> Self {
        let Some(index) = table.column_index(column) else {
            return Self::default();
        };
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<TokenCount> = Vec::new();
        for cell in table.column_cells(index) {
            let Some(text) = cell.as_text() else {
                continue;
            };
            for token in tokenize(text) {
                match positions.get(token) {
                    Some(&position) => entries[position].count += 1,
                    None => {
                        positions.insert(token, entries.len());
                        entries.push(TokenCount {
                            token: token.to_string(),
                            count: 1,
                        });
                    }
                }
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, token: &str) -> usize {
        self.entries
            .iter()
            .find(|entry| entry.token == token)
            .map_or(0, |entry| entry.count)
    }

    /// Total number of tokens seen.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    /// The `n` most frequent tokens; ties keep first-occurrence order.
    pub fn top(&self, n: usize) -> Vec<TokenCount> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

/// Splits a note cell on runs of whitespace.
pub fn tokenize(cell: &str) -> impl Iterator<Item = &str> {
    cell.split_whitespace()
}

pub fn top_tokens(table: &Table, column: &str, n: usize) -> Vec<TokenCount> {
    FrequencyTable::from_column(table, column).top(n)
}

pub fn top_notes(table: &Table, schema: &DatasetSchema, layer: NoteLayer, n: usize) -> LayerRanking {
    let column = schema.note_column(layer);
    LayerRanking {
        layer,
        column: column.to_string(),
        tokens: top_tokens(table, column, n),
    }
}

pub fn top_notes_by_layer(table: &Table, schema: &DatasetSchema, n: usize) -> Vec<LayerRanking> {
    NoteLayer::ALL
        .iter()
        .map(|&layer| top_notes(table, schema, layer, n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::Cell,
        schema::ColumnKind,
        table::{Column, Row},
    };

    fn notes(cells: &[&str]) -> Table {
        Table::new(
            vec![Column {
                name: "Top".to_string(),
                kind: ColumnKind::Text,
            }],
            cells.iter().map(|c| Row::new(vec![Cell::text(c)])).collect(),
        )
    }

    #[test]
    fn repeated_tokens_count_per_occurrence() {
        let table = notes(&["rose rose musk"; 4]);
        let top = top_tokens(&table, "Top", 5);
        assert_eq!(
            top,
            vec![
                TokenCount {
                    token: "rose".to_string(),
                    count: 8
                },
                TokenCount {
                    token: "musk".to_string(),
                    count: 4
                },
            ]
        );
    }

    #[test]
    fn whitespace_runs_and_blank_cells_are_ignored() {
        let table = notes(&["  bergamot \t lemon\n", "", "   ", "lemon"]);
        let freq = FrequencyTable::from_column(&table, "Top");
        assert_eq!(freq.len(), 2);
        assert_eq!(freq.count("lemon"), 2);
        assert_eq!(freq.total(), 3);
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let table = notes(&["Vanilla vanilla"]);
        let freq = FrequencyTable::from_column(&table, "Top");
        assert_eq!(freq.count("Vanilla"), 1);
        assert_eq!(freq.count("vanilla"), 1);
    }

    #[test]
    fn ties_follow_first_occurrence() {
        let table = notes(&["amber iris", "oud iris amber", "oud"]);
        let top = top_tokens(&table, "Top", 3)
            .into_iter()
            .map(|t| t.token)
            .collect::<Vec<_>>();
        assert_eq!(top, vec!["amber", "iris", "oud"]);
    }

    #[test]
    fn absent_column_yields_nothing() {
        assert!(top_tokens(&notes(&["rose"]), "Base", 10).is_empty());
    }

    #[test]
    fn layers_resolve_through_schema() {
        let rankings = top_notes_by_layer(&notes(&["rose"]), &DatasetSchema::default(), 10);
        assert_eq!(rankings.len(), 3);
        assert_eq!(rankings[0].tokens.len(), 1);
        assert!(rankings[2].tokens.is_empty());
    }
}
