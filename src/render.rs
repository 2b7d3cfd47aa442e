//! Plain-text tables for terminal output.

use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_aligned(headers, rows, &[])
}

/// Renders `rows` under `headers`. Columns without an entry in `alignments` are
/// left-aligned.
pub fn render_aligned(headers: &[String], rows: &[Vec<String>], alignments: &[Align]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    let widths = widths.into_iter().map(|w| w.max(3)).collect::<Vec<_>>();

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths, &[]));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &[]));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, alignments));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>], alignments: &[Align]) {
    print!("{}", render_aligned(headers, rows, alignments));
}

fn format_row(values: &[String], widths: &[usize], alignments: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match alignments.get(idx) {
                Some(Align::Right) => format!("{padding}{sanitized}"),
                _ => format!("{sanitized}{padding}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
