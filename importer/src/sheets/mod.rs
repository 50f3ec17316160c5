//! Remote table writer.
//!
//! [`write_to_sheet`] reconciles a named sheet/worksheet with a cleaned
//! dataset through any [`SpreadsheetService`]:
//!
//! ```text
//! open-or-create sheet → open-or-create worksheet → render grid → overwrite | append → url
//! ```
//!
//! Each remote call is a separate mutation. Nothing is rolled back if a later
//! call fails, so an overwrite that fails after `clear` leaves the worksheet
//! empty.
//!
//! Implementations:
//! - [`google::GoogleSheetsClient`] - Google Sheets v4 / Drive v3 over HTTPS
//! - [`memory::InMemorySheets`] - process-local, for tests and dry runs

pub mod auth;
pub mod google;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WriteMode;
use crate::error::SheetsResult;
use crate::logs::{log_info, log_success};
use crate::models::Dataset;

pub use auth::{ServiceAccountTokens, StaticToken, TokenSource};
pub use google::GoogleSheetsClient;
pub use memory::InMemorySheets;

/// Rows of a freshly created worksheet.
pub const DEFAULT_WORKSHEET_ROWS: u32 = 1000;

/// Columns of a freshly created worksheet.
pub const DEFAULT_WORKSHEET_COLS: u32 = 26;

/// Rectangular block of cell strings, row-major.
pub type Grid = Vec<Vec<String>>;

/// Outcome of a lookup by name.
///
/// Absence is an ordinary outcome; real failures (permissions, network)
/// are reported through the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    Absent,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent => None,
        }
    }
}

/// A spreadsheet (top-level container).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetHandle {
    pub id: String,
    pub title: String,
    /// Canonical URL of the spreadsheet
    pub url: String,
}

/// A worksheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksheetHandle {
    pub spreadsheet_id: String,
    pub sheet_id: i64,
    pub title: String,
}

/// Operations consumed from a remote spreadsheet service.
#[async_trait]
pub trait SpreadsheetService: Send + Sync {
    /// Find a spreadsheet by name.
    async fn open_sheet(&self, name: &str) -> SheetsResult<Lookup<SheetHandle>>;

    /// Create a new spreadsheet.
    async fn create_sheet(&self, name: &str) -> SheetsResult<SheetHandle>;

    /// Find a worksheet by exact title.
    async fn open_worksheet(
        &self,
        sheet: &SheetHandle,
        title: &str,
    ) -> SheetsResult<Lookup<WorksheetHandle>>;

    /// Add a worksheet with the given grid capacity.
    async fn add_worksheet(
        &self,
        sheet: &SheetHandle,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> SheetsResult<WorksheetHandle>;

    /// Read every non-empty row of the worksheet.
    async fn get_all_values(&self, worksheet: &WorksheetHandle) -> SheetsResult<Grid>;

    /// Remove all values from the worksheet.
    async fn clear(&self, worksheet: &WorksheetHandle) -> SheetsResult<()>;

    /// Write `values` starting at the top-left cell.
    async fn update(&self, worksheet: &WorksheetHandle, values: &[Vec<String>]) -> SheetsResult<()>;

    /// Append `rows` after the last row holding data.
    async fn append_rows(
        &self,
        worksheet: &WorksheetHandle,
        rows: &[Vec<String>],
    ) -> SheetsResult<()>;
}

/// Render a dataset as header row + data rows. Missing cells become `""`.
pub fn render_grid(dataset: &Dataset) -> Grid {
    let mut grid = Vec::with_capacity(dataset.len() + 1);
    grid.push(dataset.columns.clone());
    grid.extend(
        dataset
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.render()).collect()),
    );
    grid
}

/// Open the sheet by name, creating it if absent.
pub async fn open_or_create_sheet<S>(client: &S, name: &str) -> SheetsResult<SheetHandle>
where
    S: SpreadsheetService + ?Sized,
{
    match client.open_sheet(name).await? {
        Lookup::Found(sheet) => Ok(sheet),
        Lookup::Absent => {
            log_info(format!("Sheet '{}' not found, creating it", name));
            client.create_sheet(name).await
        }
    }
}

/// Open the worksheet by title, creating it with default capacity if absent.
pub async fn open_or_create_worksheet<S>(
    client: &S,
    sheet: &SheetHandle,
    title: &str,
) -> SheetsResult<WorksheetHandle>
where
    S: SpreadsheetService + ?Sized,
{
    match client.open_worksheet(sheet, title).await? {
        Lookup::Found(worksheet) => Ok(worksheet),
        Lookup::Absent => {
            log_info(format!("Worksheet '{}' not found, creating it", title));
            client
                .add_worksheet(sheet, title, DEFAULT_WORKSHEET_ROWS, DEFAULT_WORKSHEET_COLS)
                .await
        }
    }
}

/// Upload `dataset` to `sheet_name`/`worksheet_name` and return the sheet URL.
///
/// - `Overwrite`: clear, then write header + rows from the top-left cell.
/// - `Append`: if the worksheet is empty, write header + rows; otherwise
///   append only the data rows after the existing content.
pub async fn write_to_sheet<S>(
    client: &S,
    sheet_name: &str,
    worksheet_name: &str,
    dataset: &Dataset,
    mode: WriteMode,
) -> SheetsResult<String>
where
    S: SpreadsheetService + ?Sized,
{
    let sheet = open_or_create_sheet(client, sheet_name).await?;
    let worksheet = open_or_create_worksheet(client, &sheet, worksheet_name).await?;

    let values = render_grid(dataset);

    match mode {
        WriteMode::Append => {
            let existing = client.get_all_values(&worksheet).await?;
            if existing.is_empty() {
                client.update(&worksheet, &values).await?;
                log_success(format!("Worksheet was empty, wrote header + {} rows", dataset.len()));
            } else {
                let rows = values.get(1..).unwrap_or_default();
                client.append_rows(&worksheet, rows).await?;
                log_success(format!(
                    "Appended {} rows after {} existing rows",
                    rows.len(),
                    existing.len()
                ));
            }
        }
        WriteMode::Overwrite => {
            client.clear(&worksheet).await?;
            client.update(&worksheet, &values).await?;
            log_success(format!("Wrote header + {} rows", dataset.len()));
        }
    }

    Ok(sheet.url)
}
