//! Error types for the sheetload import pipeline.
//!
//! One enum per component, converted upward into [`ImportError`]:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`ConfigError`] - Config file and credential errors
//! - [`SheetsError`] - Remote spreadsheet service errors
//! - [`ImportError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! A remote "not found" is not an error here: lookups return
//! [`crate::sheets::Lookup::Absent`] instead.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors while reading the input CSV.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Bytes could not be decoded with the detected encoding.
    #[error("Failed to decode content as {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::IoError(io),
            csv::ErrorKind::UnequalLengths { expected_len, len, .. } => CsvError::ParseError {
                line,
                message: format!("expected {} fields, found {}", expected_len, len),
            },
            other => CsvError::ParseError {
                line,
                message: format!("{:?}", other),
            },
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the job configuration or credentials.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `GOOGLE_CREDS_PATH` unset, empty or pointing nowhere.
    #[error("GOOGLE_CREDS_PATH missing or file not found: {0}")]
    MissingCredentials(String),

    /// Failed to read the config file.
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    /// Config is not valid JSON or has wrong value types.
    #[error("Invalid config JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Remote Spreadsheet Errors
// =============================================================================

/// Errors from the remote spreadsheet service.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Could not obtain an access token for the service account.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (DNS, TLS, connection reset...).
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    /// The service refused the credentials (401/403).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other non-success response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Handle refers to a sheet or worksheet the service does not know.
    #[error("Unknown {kind}: {name}")]
    UnknownHandle { kind: &'static str, name: String },
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        SheetsError::RequestFailed(err.to_string())
    }
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Top-level import errors.
///
/// This is the error type returned by the orchestration code in `main`.
/// It wraps all lower-level errors.
#[derive(Debug, Error)]
pub enum ImportError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Config or credential error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Remote spreadsheet error.
    #[error("Sheets error: {0}")]
    Sheets(#[from] SheetsError),

    /// Report serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ImportError {
    /// Credential problems are the only failure with a dedicated exit status.
    pub fn is_credentials(&self) -> bool {
        matches!(
            self,
            ImportError::Config(ConfigError::MissingCredentials(_))
                | ImportError::Sheets(SheetsError::Auth(_))
        )
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for remote spreadsheet operations.
pub type SheetsResult<T> = Result<T, SheetsError>;

/// Result type for a whole import run.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> ImportError
        let csv_err = CsvError::EmptyFile;
        let import_err: ImportError = csv_err.into();
        assert!(import_err.to_string().contains("empty"));

        // SheetsError -> ImportError
        let sheets_err = SheetsError::PermissionDenied("caller lacks access".into());
        let import_err: ImportError = sheets_err.into();
        assert!(import_err.to_string().contains("caller lacks access"));
    }

    #[test]
    fn test_credentials_classification() {
        let missing: ImportError = ConfigError::MissingCredentials("unset".into()).into();
        assert!(missing.is_credentials());

        let auth: ImportError = SheetsError::Auth("bad key".into()).into();
        assert!(auth.is_credentials());

        let denied: ImportError = SheetsError::PermissionDenied("nope".into()).into();
        assert!(!denied.is_credentials());
    }

    #[test]
    fn test_api_error_format() {
        let err = SheetsError::Api {
            status: 429,
            message: "Quota exceeded".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("Quota exceeded"));
    }

    #[test]
    fn test_csv_unequal_lengths_maps_to_parse_error() {
        let data = "a,b\n1,2,3\n";
        let mut reader = csv::ReaderBuilder::new().from_reader(data.as_bytes());
        let err = reader
            .records()
            .next()
            .expect("one record")
            .expect_err("row is longer than header");
        match CsvError::from(err) {
            CsvError::ParseError { message, .. } => assert!(message.contains("expected 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
