//! CSV reader producing a typed [`Dataset`].
//!
//! Handles encoding detection, then reads standard comma-delimited CSV with a
//! required header row. Empty fields become [`crate::models::Cell::Missing`]; each column is
//! typed from its values (integer, float, boolean, or text).

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::Dataset;

/// Default field delimiter.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8. A leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::EncodingError(format!("utf-8 ({})", e)))?,
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    Ok(match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    })
}

/// Read a CSV file from disk.
pub fn parse_csv_file(path: impl AsRef<Path>) -> CsvResult<Dataset> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

/// Parse CSV bytes, detecting the encoding first.
pub fn parse_bytes(bytes: &[u8]) -> CsvResult<Dataset> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let content = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => decode_content(text.as_bytes(), "utf-8")?,
        Err(_) => {
            let encoding = detect_encoding(bytes);
            decode_content(bytes, &encoding)?
        }
    };

    parse_str(&content, DEFAULT_DELIMITER)
}

/// Parse CSV text with an explicit delimiter.
///
/// # Example
/// ```ignore
/// use sheetload::parser::parse_str;
///
/// let ds = parse_str("name,age\nAlice,30\nBob,", b',').unwrap();
/// assert_eq!(ds.columns, vec!["name", "age"]);
/// assert!(ds.rows[1][1].is_missing());
/// ```
pub fn parse_str(content: &str, delimiter: u8) -> CsvResult<Dataset> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Dataset::from_raw(headers, raw_rows))
}
