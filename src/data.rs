use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker for a cell whose raw text could not be coerced to its declared type.
///
/// This is a data state, not an error: the row stays in the table and every
/// numeric computation skips the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingValue;

impl fmt::Display for MissingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("missing")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberStyle {
    /// `3.72`
    #[default]
    Standard,
    /// `3,72` as well as `3.72`
    DecimalComma,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Missing,
}

impl Cell {
    pub fn text(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Missing
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn numeric(raw: &str, style: NumberStyle) -> Self {
        coerce_numeric(raw, style).into()
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Categorical key for the cell. Numbers use their display form so a numeric
    /// column can still be counted or grouped.
    pub fn key(&self) -> Option<String> {
        match self {
            Cell::Text(value) => Some(value.clone()),
            Cell::Number(value) => Some(format_number(*value)),
            Cell::Missing => None,
        }
    }
}

impl From<Result<f64, MissingValue>> for Cell {
    fn from(value: Result<f64, MissingValue>) -> Self {
        match value {
            Ok(number) => Cell::Number(number),
            Err(MissingValue) => Cell::Missing,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(value) => f.write_str(value),
            Cell::Number(value) => f.write_str(&format_number(*value)),
            Cell::Missing => Ok(()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Cell::Text(value) => serializer.serialize_str(value),
            Cell::Number(value) => serializer.serialize_f64(*value),
            Cell::Missing => serializer.serialize_none(),
        }
    }
}

/// Coerces one raw cell into a finite number.
///
/// Surrounding whitespace is ignored. Empty text, unparsable text and non-finite
/// results (`NaN`, `inf`) all come back as [`MissingValue`].
pub fn coerce_numeric(raw: &str, style: NumberStyle) -> Result<f64, MissingValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MissingValue);
    }
    let parsed = match style {
        NumberStyle::Standard => trimmed.parse::<f64>(),
        NumberStyle::DecimalComma => trimmed.replacen(',', ".", 1).parse::<f64>(),
    };
    match parsed {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MissingValue),
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

/// Renders an optional statistic, using `N/A` for values that are not available.
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_numeric_accepts_padded_numbers() {
        assert_eq!(coerce_numeric(" 4.25 ", NumberStyle::Standard), Ok(4.25));
        assert_eq!(coerce_numeric("2019", NumberStyle::Standard), Ok(2019.0));
    }

    #[test]
    fn coerce_numeric_marks_garbage_as_missing() {
        assert_eq!(coerce_numeric("", NumberStyle::Standard), Err(MissingValue));
        assert_eq!(coerce_numeric("n/a", NumberStyle::Standard), Err(MissingValue));
        assert_eq!(coerce_numeric("NaN", NumberStyle::Standard), Err(MissingValue));
        assert_eq!(coerce_numeric("inf", NumberStyle::Standard), Err(MissingValue));
        assert_eq!(coerce_numeric("3,72", NumberStyle::Standard), Err(MissingValue));
    }

    #[test]
    fn decimal_comma_style_accepts_both_separators() {
        assert_eq!(coerce_numeric("3,72", NumberStyle::DecimalComma), Ok(3.72));
        assert_eq!(coerce_numeric("3.72", NumberStyle::DecimalComma), Ok(3.72));
        assert_eq!(
            coerce_numeric("1,000,5", NumberStyle::DecimalComma),
            Err(MissingValue)
        );
    }

    #[test]
    fn empty_text_cells_are_missing() {
        assert!(Cell::text("").is_missing());
        assert_eq!(Cell::text(" "), Cell::Text(" ".to_string()));
    }

    #[test]
    fn format_metric_uses_sentinel_for_unavailable_values() {
        assert_eq!(format_metric(Some(3.756)), "3.76");
        assert_eq!(format_metric(None), "N/A");
    }

    #[test]
    fn numeric_keys_use_display_form() {
        assert_eq!(Cell::Number(2019.0).key().as_deref(), Some("2019"));
        assert_eq!(Cell::Missing.key(), None);
    }
}
