//! In-process spreadsheet service.
//!
//! Mirrors the observable behavior of the Google backend closely enough to
//! exercise the writer: new spreadsheets start with a `Sheet1` tab, reads
//! drop trailing empty rows, appends land after the last row with data.
//! Every call is recorded so callers can inspect the sequence of operations.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use super::{
    Grid, Lookup, SheetHandle, SpreadsheetService, WorksheetHandle, DEFAULT_WORKSHEET_COLS,
    DEFAULT_WORKSHEET_ROWS,
};
use crate::error::{SheetsError, SheetsResult};

const MEMORY_URL_PREFIX: &str = "memory://spreadsheets/";

#[derive(Debug, Default)]
struct MemoryWorksheet {
    sheet_id: i64,
    title: String,
    rows: u32,
    cols: u32,
    values: Grid,
}

#[derive(Debug, Default)]
struct MemorySheet {
    id: String,
    title: String,
    worksheets: Vec<MemoryWorksheet>,
}

#[derive(Debug, Default)]
struct State {
    sheets: Vec<MemorySheet>,
    next_id: i64,
    operations: Vec<String>,
}

/// Spreadsheet service backed by process memory.
#[derive(Debug, Default)]
pub struct InMemorySheets {
    state: Mutex<State>,
}

impl InMemorySheets {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Calls made so far, as `"<operation> <name>"`.
    pub fn operations(&self) -> Vec<String> {
        self.state().operations.clone()
    }

    pub fn sheet_count(&self) -> usize {
        self.state().sheets.len()
    }

    /// Grid capacity (rows, columns) of a worksheet.
    pub fn capacity(&self, worksheet: &WorksheetHandle) -> Option<(u32, u32)> {
        let state = self.state();
        state
            .sheets
            .iter()
            .find(|s| s.id == worksheet.spreadsheet_id)
            .and_then(|s| s.worksheets.iter().find(|w| w.sheet_id == worksheet.sheet_id))
            .map(|w| (w.rows, w.cols))
    }

    fn handle(sheet: &MemorySheet) -> SheetHandle {
        SheetHandle {
            id: sheet.id.clone(),
            title: sheet.title.clone(),
            url: format!("{}{}", MEMORY_URL_PREFIX, sheet.id),
        }
    }
}

impl State {
    fn record(&mut self, operation: &str, name: &str) {
        self.operations.push(format!("{} {}", operation, name));
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn sheet_mut(&mut self, id: &str) -> SheetsResult<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SheetsError::UnknownHandle {
                kind: "spreadsheet",
                name: id.to_string(),
            })
    }

    fn worksheet_mut(&mut self, handle: &WorksheetHandle) -> SheetsResult<&mut MemoryWorksheet> {
        self.sheet_mut(&handle.spreadsheet_id)?
            .worksheets
            .iter_mut()
            .find(|w| w.sheet_id == handle.sheet_id)
            .ok_or_else(|| SheetsError::UnknownHandle {
                kind: "worksheet",
                name: handle.title.clone(),
            })
    }
}

/// Number of leading rows that hold at least one non-empty cell.
fn used_rows(values: &Grid) -> usize {
    values
        .iter()
        .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

/// Write `rows` into `values` starting at row `start`, column A.
fn write_at(values: &mut Grid, start: usize, rows: &[Vec<String>]) {
    for (offset, row) in rows.iter().enumerate() {
        let idx = start + offset;
        if values.len() <= idx {
            values.resize_with(idx + 1, Vec::new);
        }
        let target = &mut values[idx];
        if target.len() < row.len() {
            target.resize(row.len(), String::new());
        }
        target[..row.len()].clone_from_slice(row);
    }
}

#[async_trait]
impl SpreadsheetService for InMemorySheets {
    async fn open_sheet(&self, name: &str) -> SheetsResult<Lookup<SheetHandle>> {
        let mut state = self.state();
        state.record("open_sheet", name);
        Ok(match state.sheets.iter().find(|s| s.title == name) {
            Some(sheet) => Lookup::Found(Self::handle(sheet)),
            None => Lookup::Absent,
        })
    }

    async fn create_sheet(&self, name: &str) -> SheetsResult<SheetHandle> {
        let mut state = self.state();
        state.record("create_sheet", name);
        let id = format!("mem-{}", state.allocate_id());
        let default_tab = MemoryWorksheet {
            sheet_id: 0,
            title: "Sheet1".to_string(),
            rows: DEFAULT_WORKSHEET_ROWS,
            cols: DEFAULT_WORKSHEET_COLS,
            values: Grid::new(),
        };
        let sheet = MemorySheet {
            id,
            title: name.to_string(),
            worksheets: vec![default_tab],
        };
        let handle = Self::handle(&sheet);
        state.sheets.push(sheet);
        Ok(handle)
    }

    async fn open_worksheet(
        &self,
        sheet: &SheetHandle,
        title: &str,
    ) -> SheetsResult<Lookup<WorksheetHandle>> {
        let mut state = self.state();
        state.record("open_worksheet", title);
        let found = state
            .sheet_mut(&sheet.id)?
            .worksheets
            .iter()
            .find(|w| w.title == title)
            .map(|w| WorksheetHandle {
                spreadsheet_id: sheet.id.clone(),
                sheet_id: w.sheet_id,
                title: w.title.clone(),
            });
        Ok(match found {
            Some(handle) => Lookup::Found(handle),
            None => Lookup::Absent,
        })
    }

    async fn add_worksheet(
        &self,
        sheet: &SheetHandle,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> SheetsResult<WorksheetHandle> {
        let mut state = self.state();
        state.record("add_worksheet", title);
        let sheet_id = state.allocate_id();
        state.sheet_mut(&sheet.id)?.worksheets.push(MemoryWorksheet {
            sheet_id,
            title: title.to_string(),
            rows,
            cols,
            values: Grid::new(),
        });
        Ok(WorksheetHandle {
            spreadsheet_id: sheet.id.clone(),
            sheet_id,
            title: title.to_string(),
        })
    }

    async fn get_all_values(&self, worksheet: &WorksheetHandle) -> SheetsResult<Grid> {
        let mut state = self.state();
        state.record("get_all_values", &worksheet.title);
        let ws = state.worksheet_mut(worksheet)?;
        let used = used_rows(&ws.values);
        Ok(ws.values[..used].to_vec())
    }

    async fn clear(&self, worksheet: &WorksheetHandle) -> SheetsResult<()> {
        let mut state = self.state();
        state.record("clear", &worksheet.title);
        state.worksheet_mut(worksheet)?.values.clear();
        Ok(())
    }

    async fn update(
        &self,
        worksheet: &WorksheetHandle,
        values: &[Vec<String>],
    ) -> SheetsResult<()> {
        let mut state = self.state();
        state.record("update", &worksheet.title);
        let ws = state.worksheet_mut(worksheet)?;
        write_at(&mut ws.values, 0, values);
        grow(ws);
        Ok(())
    }

    async fn append_rows(
        &self,
        worksheet: &WorksheetHandle,
        rows: &[Vec<String>],
    ) -> SheetsResult<()> {
        let mut state = self.state();
        state.record("append_rows", &worksheet.title);
        let ws = state.worksheet_mut(worksheet)?;
        let start = used_rows(&ws.values);
        write_at(&mut ws.values, start, rows);
        grow(ws);
        Ok(())
    }
}

/// Expand the recorded capacity to cover written values.
fn grow(ws: &mut MemoryWorksheet) {
    let rows = u32::try_from(ws.values.len()).unwrap_or(u32::MAX);
    let cols = ws.values.iter().map(Vec::len).max().unwrap_or(0);
    let cols = u32::try_from(cols).unwrap_or(u32::MAX);
    ws.rows = ws.rows.max(rows);
    ws.cols = ws.cols.max(cols);
}
