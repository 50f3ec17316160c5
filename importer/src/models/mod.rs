//! Domain models for the sheetload pipeline.
//!
//! - [`Cell`] - A single value, possibly missing
//! - [`ColumnKind`] - Inferred type of a column
//! - [`Dataset`] - Ordered columns plus rows of cells

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// A single cell value.
///
/// `Missing` is distinct from `Text("")` in memory; both render as an
/// empty string when uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Missing,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Build a text cell.
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Read a raw field as the narrowest value it spells.
    ///
    /// Empty fields are missing. Integers win over floats, floats over
    /// booleans; anything else is text.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Cell::Missing;
        }
        if let Ok(i) = raw.trim().parse::<i64>() {
            return Cell::Integer(i);
        }
        if let Some(f) = parse_float(raw) {
            return Cell::Float(f);
        }
        if let Some(b) = parse_bool(raw) {
            return Cell::Bool(b);
        }
        Cell::text(raw)
    }

    /// Read a raw field as a value of `kind`, keeping the raw text otherwise.
    pub fn coerce(raw: String, kind: ColumnKind) -> Self {
        if raw.is_empty() {
            return Cell::Missing;
        }
        let typed = match kind {
            ColumnKind::Integer => raw.trim().parse().ok().map(Cell::Integer),
            ColumnKind::Float => parse_float(&raw).map(Cell::Float),
            ColumnKind::Bool => parse_bool(&raw).map(Cell::Bool),
            ColumnKind::Text => None,
        };
        typed.unwrap_or(Cell::Text(raw))
    }

    /// Render the value the way it is written to a worksheet.
    ///
    /// Missing cells become `""`, never `"null"` or `"None"`.
    pub fn render(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Integer(i) => i.to_string(),
            Cell::Float(f) => render_float(*f),
            Cell::Bool(true) => "True".to_string(),
            Cell::Bool(false) => "False".to_string(),
        }
    }

    /// Equality key used for deduplication. All missing cells share one key.
    pub fn dedupe_key(&self) -> Option<String> {
        match self {
            Cell::Missing => None,
            other => Some(other.render()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Shortest round-trip float text, positional for decimal exponents in
/// `-4..16` and scientific (`1e-05`, `1.5e+20`) outside it.
fn render_float(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..16).contains(&exponent) {
        if value.fract() == 0.0 {
            format!("{:.1}", value)
        } else {
            value.to_string()
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

/// Float spelled with digits only; words like "nan" or "inf" stay text.
fn parse_float(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Column Kind
// =============================================================================

/// Inferred type of a column. Only `Text` columns are whitespace-trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Bool,
}

impl ColumnKind {
    pub fn is_textual(self) -> bool {
        self == ColumnKind::Text
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Tabular dataset: ordered column names shared by every row.
///
/// Each row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Create a dataset, inferring each column's kind from its cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let kinds = (0..columns.len())
            .map(|idx| infer_kind(rows.iter().filter_map(|row| row.get(idx))))
            .collect();
        Self { columns, kinds, rows }
    }

    /// Create a dataset from raw string fields, as read from a CSV file.
    ///
    /// Each column takes the kind its fields agree on (see [`infer_kind`]);
    /// fields are then read as that kind, so a text column keeps numeric
    /// looking values verbatim.
    pub fn from_raw(columns: Vec<String>, raw_rows: Vec<Vec<String>>) -> Self {
        let candidates: Vec<Vec<Cell>> = raw_rows
            .iter()
            .map(|row| row.iter().map(|raw| Cell::parse(raw)).collect())
            .collect();
        let kinds: Vec<ColumnKind> = (0..columns.len())
            .map(|idx| infer_kind(candidates.iter().filter_map(|row| row.get(idx))))
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&kinds)
                    .map(|(raw, kind)| Cell::coerce(raw, *kind))
                    .collect()
            })
            .collect();

        Self { columns, kinds, rows }
    }

    /// [`Dataset::from_raw`] over borrowed strings.
    pub fn from_strings<S: AsRef<str>>(columns: &[S], rows: &[Vec<S>]) -> Self {
        let columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| v.as_ref().to_string()).collect())
            .collect();
        Self::from_raw(columns, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn kind(&self, idx: usize) -> Option<ColumnKind> {
        self.kinds.get(idx).copied()
    }

    /// Iterate over one column's cells.
    pub fn column_cells(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Number of missing cells in a column.
    pub fn missing_count(&self, idx: usize) -> usize {
        self.column_cells(idx).filter(|c| c.is_missing()).count()
    }
}

/// Infer a column kind from its cells.
///
/// Missing cells are ignored; a column with no values is `Float`,
/// so it is never treated as textual.
pub fn infer_kind<'a>(cells: impl Iterator<Item = &'a Cell>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells {
        let cell_kind = match cell {
            Cell::Missing => continue,
            Cell::Text(_) => return ColumnKind::Text,
            Cell::Integer(_) => ColumnKind::Integer,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Bool(_) => ColumnKind::Bool,
        };
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Float)
}
