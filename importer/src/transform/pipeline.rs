//! Cleaning pipeline: normalize, trim, parse dates, deduplicate.
//!
//! [`clean`] is pure: it takes a dataset and a config and returns the cleaned
//! dataset plus a [`TransformReport`]. It never touches the network or the
//! filesystem.
//!
//! Steps run in a fixed order so that deduplication compares values after
//! trimming and date normalization:
//!
//! ```text
//! columns → trim → dates → dedupe → report
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetload::{clean, parse_str, ImportConfig};
//!
//! let ds = parse_str("Name\n Alice \n Alice \n", b',')?;
//! let (cleaned, report) = clean(ds, &ImportConfig::default());
//! assert_eq!(report.rows_in, 2);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::dates::normalize_date_cell;
use crate::config::ImportConfig;
use crate::models::{Cell, ColumnKind, Dataset};

/// Summary of what the pipeline did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformReport {
    /// Rows before any step
    pub rows_in: usize,
    /// Rows after deduplication
    pub rows_out: usize,
    /// Rows dropped as duplicates of an earlier row
    pub duplicates_removed: usize,
    /// Date cells that were present and failed to parse
    pub invalid_dates: usize,
    /// Final column names, in order
    pub columns: Vec<String>,
}

impl TransformReport {
    /// One-line summary for progress output.
    pub fn summary(&self) -> String {
        format!(
            "Rows in: {} | Rows out: {} | Duplicates removed: {} | Invalid dates: {}",
            self.rows_in, self.rows_out, self.duplicates_removed, self.invalid_dates
        )
    }
}

/// Normalize a column name: trim, then lowercase if requested.
///
/// Used for dataset columns and for every name coming from the config,
/// so lookups match regardless of the original casing.
pub fn normalize_column_name(name: &str, lowercase: bool) -> String {
    let trimmed = name.trim();
    if lowercase {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Run the full cleaning pipeline.
pub fn clean(mut dataset: Dataset, config: &ImportConfig) -> (Dataset, TransformReport) {
    let mut report = TransformReport {
        rows_in: dataset.len(),
        ..TransformReport::default()
    };

    normalize_columns(&mut dataset, config.lowercase_columns);

    if config.trim_whitespace {
        trim_text_columns(&mut dataset);
    }

    report.invalid_dates = normalize_dates(&mut dataset, config);

    if let Some(key) = &config.dedupe_key {
        let key = normalize_column_name(key, config.lowercase_columns);
        report.duplicates_removed = dedupe_by(&mut dataset, &key);
    }

    report.rows_out = dataset.len();
    report.columns = dataset.columns.clone();
    (dataset, report)
}

/// Step 1: normalize every column name in place.
pub fn normalize_columns(dataset: &mut Dataset, lowercase: bool) {
    for column in &mut dataset.columns {
        *column = normalize_column_name(column, lowercase);
    }
}

/// Step 2: trim text cells of textual columns. Other kinds are untouched.
pub fn trim_text_columns(dataset: &mut Dataset) {
    let textual: Vec<usize> = (0..dataset.columns.len())
        .filter(|&idx| dataset.kind(idx).is_some_and(ColumnKind::is_textual))
        .collect();

    for row in &mut dataset.rows {
        for &idx in &textual {
            if let Some(Cell::Text(value)) = row.get_mut(idx) {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }
    }
}

/// Step 3: parse configured date columns.
///
/// Returns the number of cells that were present before parsing and missing
/// after. Names not found among the columns are skipped.
pub fn normalize_dates(dataset: &mut Dataset, config: &ImportConfig) -> usize {
    let mut seen = HashSet::new();
    let mut invalid = 0;

    for name in &config.date_columns {
        let name = normalize_column_name(name, config.lowercase_columns);
        if !seen.insert(name.clone()) {
            continue;
        }
        let Some(idx) = dataset.column_index(&name) else {
            continue;
        };

        let before = dataset.missing_count(idx);
        for row in &mut dataset.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = normalize_date_cell(cell);
            }
        }
        if let Some(kind) = dataset.kinds.get_mut(idx) {
            *kind = ColumnKind::Text;
        }
        let after = dataset.missing_count(idx);
        invalid += after.saturating_sub(before);
    }

    invalid
}

/// Step 4: drop rows whose `key` value repeats an earlier row.
///
/// Keeps first occurrences in original order. Returns the number of rows
/// removed; an unknown key removes nothing.
pub fn dedupe_by(dataset: &mut Dataset, key: &str) -> usize {
    let Some(idx) = dataset.column_index(key) else {
        return 0;
    };

    let before = dataset.len();
    let mut seen: HashSet<Option<String>> = HashSet::new();
    dataset
        .rows
        .retain(|row| seen.insert(row.get(idx).and_then(Cell::dedupe_key)));
    before - dataset.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn config() -> ImportConfig {
        ImportConfig::default()
    }

    fn texts(ds: &Dataset, col: usize) -> Vec<String> {
        ds.column_cells(col).map(Cell::render).collect()
    }

    #[test]
    fn test_scenario_trim_and_dedupe() {
        let ds = parse_str(
            "name,Email \n Alice ,a@x.com\n Alice ,a@x.com\nBob,b@x.com",
            b',',
        )
        .unwrap();
        let cfg = ImportConfig {
            dedupe_key: Some("name".into()),
            ..config()
        };

        let (cleaned, report) = clean(ds, &cfg);

        assert_eq!(cleaned.columns, vec!["name", "email"]);
        assert_eq!(texts(&cleaned, 0), vec!["Alice", "Bob"]);
        assert_eq!(
            report,
            TransformReport {
                rows_in: 3,
                rows_out: 2,
                duplicates_removed: 1,
                invalid_dates: 0,
                columns: vec!["name".into(), "email".into()],
            }
        );
    }

    #[test]
    fn test_scenario_invalid_dates() {
        let ds = Dataset::from_strings(
            &["When"],
            &[vec!["2020-01-01"], vec!["not-a-date"], vec![""]],
        );
        let cfg = ImportConfig {
            date_columns: vec!["when".into()],
            ..config()
        };

        let (cleaned, report) = clean(ds, &cfg);

        assert_eq!(report.invalid_dates, 1);
        assert_eq!(texts(&cleaned, 0), vec!["2020-01-01 00:00:00", "", ""]);
        assert!(cleaned.rows[1][0].is_missing());
        assert!(cleaned.rows[2][0].is_missing());
    }

    #[test]
    fn test_empty_dataset() {
        let ds = parse_str("a,b\n", b',').unwrap();
        let cfg = ImportConfig {
            date_columns: vec!["a".into()],
            dedupe_key: Some("b".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds, &cfg);
        assert!(cleaned.is_empty());
        assert_eq!(report.rows_in, 0);
        assert_eq!(report.rows_out, 0);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.invalid_dates, 0);
    }

    #[test]
    fn test_unknown_columns_are_noops() {
        let ds = Dataset::from_strings(&["a"], &[vec!["x"], vec!["x"]]);
        let cfg = ImportConfig {
            date_columns: vec!["missing_date".into()],
            dedupe_key: Some("missing_key".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds.clone(), &cfg);
        assert_eq!(cleaned, ds);
        assert_eq!(report.duplicates_removed, 0);
        assert_eq!(report.invalid_dates, 0);
        assert_eq!(report.rows_out, 2);
    }

    #[test]
    fn test_case_insensitive_config_lookups() {
        let ds = Dataset::from_strings(
            &[" Signup Date ", "EMAIL"],
            &[vec!["2021-05-06", "a@x"], vec!["2021-05-07", "a@x"]],
        );
        let cfg = ImportConfig {
            date_columns: vec!["SIGNUP DATE".into()],
            dedupe_key: Some(" Email".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds, &cfg);
        assert_eq!(cleaned.columns, vec!["signup date", "email"]);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(texts(&cleaned, 0), vec!["2021-05-06 00:00:00"]);
    }

    #[test]
    fn test_no_lowercase_keeps_case() {
        let ds = Dataset::from_strings(&[" Name "], &[vec!["x"], vec!["x"]]);
        let cfg = ImportConfig {
            lowercase_columns: false,
            dedupe_key: Some("name".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds, &cfg);
        assert_eq!(cleaned.columns, vec!["Name"]);
        // "name" does not match "Name" when case is preserved
        assert_eq!(report.duplicates_removed, 0);
    }

    #[test]
    fn test_trim_disabled() {
        let ds = Dataset::from_strings(&["v"], &[vec![" a "]]);
        let cfg = ImportConfig {
            trim_whitespace: false,
            ..config()
        };
        let (cleaned, _) = clean(ds, &cfg);
        assert_eq!(cleaned.rows[0][0], Cell::text(" a "));
    }

    #[test]
    fn test_trim_skips_non_text_columns() {
        let mut ds = Dataset::new(
            vec!["n".into(), "t".into()],
            vec![vec![Cell::Integer(1), Cell::text("  x ")]],
        );
        trim_text_columns(&mut ds);
        assert_eq!(ds.rows[0], vec![Cell::Integer(1), Cell::text("x")]);
    }

    #[test]
    fn test_dedupe_after_trim() {
        let ds = Dataset::from_strings(&["k"], &[vec!["a"], vec![" a"], vec!["b"], vec!["a "]]);
        let cfg = ImportConfig {
            dedupe_key: Some("k".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds, &cfg);
        assert_eq!(texts(&cleaned, 0), vec!["a", "b"]);
        assert_eq!(report.duplicates_removed, 2);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence_in_order() {
        let mut ds = Dataset::from_strings(
            &["id", "v"],
            &[
                vec!["2", "first-2"],
                vec!["1", "first-1"],
                vec!["2", "second-2"],
                vec!["3", "first-3"],
                vec!["1", "second-1"],
            ],
        );
        let removed = dedupe_by(&mut ds, "id");
        assert_eq!(removed, 2);
        assert_eq!(texts(&ds, 1), vec!["first-2", "first-1", "first-3"]);
    }

    #[test]
    fn test_dedupe_treats_missing_as_equal() {
        let mut ds = Dataset::from_strings(&["k"], &[vec![""], vec!["x"], vec![""]]);
        assert_eq!(dedupe_by(&mut ds, "k"), 1);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_pre_existing_missing_dates_not_counted() {
        let ds = Dataset::from_strings(
            &["d"],
            &[vec![""], vec![""], vec!["bad"], vec!["2020-02-02"]],
        );
        let cfg = ImportConfig {
            date_columns: vec!["d".into(), "D".into()],
            ..config()
        };
        let (_, report) = clean(ds, &cfg);
        assert_eq!(report.invalid_dates, 1);
    }

    #[test]
    fn test_normalization_idempotent() {
        for name in ["  Mixed Case ", "already", "ÉCOLE", ""] {
            for lower in [true, false] {
                let once = normalize_column_name(name, lower);
                assert_eq!(normalize_column_name(&once, lower), once);
            }
        }
    }

    #[test]
    fn test_rows_out_never_exceeds_rows_in() {
        let ds = Dataset::from_strings(&["k"], &[vec!["a"], vec!["b"], vec!["a"]]);
        let cfg = ImportConfig {
            dedupe_key: Some("k".into()),
            ..config()
        };
        let (cleaned, report) = clean(ds, &cfg);
        assert_eq!(report.rows_in, 3);
        assert!(report.rows_out <= report.rows_in);
        assert_eq!(report.rows_out, cleaned.len());
    }

    #[test]
    fn test_summary_line() {
        let report = TransformReport {
            rows_in: 3,
            rows_out: 2,
            duplicates_removed: 1,
            invalid_dates: 0,
            columns: vec![],
        };
        assert_eq!(
            report.summary(),
            "Rows in: 3 | Rows out: 2 | Duplicates removed: 1 | Invalid dates: 0"
        );
    }
}
