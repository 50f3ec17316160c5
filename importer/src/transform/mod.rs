//! Cleaning module.
//!
//! - Pipeline: column normalization, trimming, dedupe, report
//! - Dates: lenient timestamp parsing for date columns

pub mod dates;
pub mod pipeline;

pub use dates::{normalize_date_cell, parse_timestamp, OUTPUT_FORMAT};
pub use pipeline::*;
