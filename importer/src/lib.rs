//! # Sheetload - CSV cleaning and Google Sheets upload
//!
//! Sheetload reads a CSV export, applies a small set of configurable cleaning
//! steps and writes the result to a named spreadsheet/worksheet, either
//! replacing its content or appending to it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Transform  │────▶│   Sheets    │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (clean+dedup│     │ (overwrite/ │
//! │             │     │             │     │   + dates)  │     │   append)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetload::{clean, load_config, parse_csv_file, write_to_sheet, InMemorySheets};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = load_config("job.json").unwrap();
//!     let dataset = parse_csv_file("input.csv").unwrap();
//!     let (cleaned, report) = clean(dataset, &config);
//!     println!("{}", report.summary());
//!
//!     let client = InMemorySheets::new();
//!     let (sheet, tab) = (&config.sheet_name, &config.worksheet_name);
//!     let url = write_to_sheet(&client, sheet, tab, &cleaned, config.mode).await.unwrap();
//!     println!("{}", url);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells and the tabular dataset
//! - [`config`] - Job configuration and credentials
//! - [`parser`] - CSV parsing with encoding detection
//! - [`transform`] - Cleaning pipeline and date normalization
//! - [`sheets`] - Spreadsheet services and the upload writer
//! - [`logs`] - Timestamped progress log

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Remote tables
pub mod sheets;

// Progress output
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, CsvError, ImportError, ImportResult, SheetsError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, ColumnKind, Dataset};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{load_config, Credentials, ImportConfig, WriteMode, CREDS_ENV_VAR};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_encoding, parse_bytes, parse_csv_file, parse_str};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{clean, TransformReport};

// =============================================================================
// Re-exports - Sheets
// =============================================================================

pub use sheets::{
    render_grid, write_to_sheet, GoogleSheetsClient, InMemorySheets, Lookup, ServiceAccountTokens,
    SpreadsheetService, StaticToken, TokenSource,
};
