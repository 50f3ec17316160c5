//! Google Sheets v4 / Drive v3 client.
//!
//! Spreadsheets are located by name through a Drive search, everything else
//! goes through the Sheets REST API. Requests carry a bearer token from a
//! [`TokenSource`].

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;

use super::auth::TokenSource;
use super::{Grid, Lookup, SheetHandle, SpreadsheetService, WorksheetHandle};
use crate::error::{SheetsError, SheetsResult};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com";

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Canonical browser URL of a spreadsheet.
pub fn sheet_url(id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{}", id)
}

/// Quote a worksheet title for A1 notation: `it's` -> `'it''s'`.
pub fn a1_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Escape a literal for a Drive search query string.
pub fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

// Response shapes (only the fields we read)

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    properties: SpreadsheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct SheetList {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Grid,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

/// Map a non-success response to an error.
fn api_error(status: u16, body: &str) -> SheetsError {
    let message = match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => body.trim().to_string(),
    };

    match status {
        401 | 403 => SheetsError::PermissionDenied(message),
        _ => SheetsError::Api { status, message },
    }
}

/// Append path segments to a base URL, percent-encoding each one.
fn endpoint(base: &str, segments: &[&str]) -> SheetsResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| SheetsError::RequestFailed(format!("Invalid endpoint {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::RequestFailed(format!("Invalid endpoint {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// [`SpreadsheetService`] backed by the Google APIs.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: Box<dyn TokenSource>,
    sheets_base: String,
    drive_base: String,
}

impl GoogleSheetsClient {
    pub fn new(tokens: impl TokenSource + 'static) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens: Box::new(tokens),
            sheets_base: SHEETS_API_BASE.to_string(),
            drive_base: DRIVE_API_BASE.to_string(),
        }
    }

    /// Point the client at other hosts (e.g. a local mock server).
    pub fn with_endpoints(
        mut self,
        sheets_base: impl Into<String>,
        drive_base: impl Into<String>,
    ) -> Self {
        self.sheets_base = sheets_base.into();
        self.drive_base = drive_base.into();
        self
    }

    fn spreadsheets_url(&self, segments: &[&str]) -> SheetsResult<Url> {
        let mut all = vec!["v4", "spreadsheets"];
        all.extend_from_slice(segments);
        endpoint(&self.sheets_base, &all)
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<Url> {
        self.spreadsheets_url(&[spreadsheet_id, "values", range])
    }

    /// Send an authorized request and decode the JSON response.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> SheetsResult<T> {
        let token = self.tokens.access_token().await?;

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| SheetsError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SpreadsheetService for GoogleSheetsClient {
    async fn open_sheet(&self, name: &str) -> SheetsResult<Lookup<SheetHandle>> {
        let mut url = endpoint(&self.drive_base, &["drive", "v3", "files"])?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            SPREADSHEET_MIME_TYPE
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id,name)");

        let list: FileList = self.send(Method::GET, url, None).await?;

        Ok(match list.files.into_iter().next() {
            Some(file) => Lookup::Found(SheetHandle {
                url: sheet_url(&file.id),
                id: file.id,
                title: file.name,
            }),
            None => Lookup::Absent,
        })
    }

    async fn create_sheet(&self, name: &str) -> SheetsResult<SheetHandle> {
        let url = self.spreadsheets_url(&[])?;
        let body = json!({ "properties": { "title": name } });

        let created: Spreadsheet = self.send(Method::POST, url, Some(body)).await?;

        Ok(SheetHandle {
            url: sheet_url(&created.spreadsheet_id),
            id: created.spreadsheet_id,
            title: created.properties.title,
        })
    }

    async fn open_worksheet(
        &self,
        sheet: &SheetHandle,
        title: &str,
    ) -> SheetsResult<Lookup<WorksheetHandle>> {
        let mut url = self.spreadsheets_url(&[sheet.id.as_str()])?;
        url.query_pairs_mut().append_pair("fields", "sheets.properties");

        let list: SheetList = self.send(Method::GET, url, None).await?;

        let found = list
            .sheets
            .into_iter()
            .map(|entry| entry.properties)
            .find(|props| props.title == title);

        Ok(match found {
            Some(props) => Lookup::Found(WorksheetHandle {
                spreadsheet_id: sheet.id.clone(),
                sheet_id: props.sheet_id,
                title: props.title,
            }),
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
        let batch = format!("{}:batchUpdate", sheet.id);
        let url = self.spreadsheets_url(&[batch.as_str()])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response: BatchUpdateResponse = self.send(Method::POST, url, Some(body)).await?;

        let props = response
            .replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|entry| entry.properties)
            .ok_or_else(|| SheetsError::InvalidResponse("addSheet reply missing".to_string()))?;

        Ok(WorksheetHandle {
            spreadsheet_id: sheet.id.clone(),
            sheet_id: props.sheet_id,
            title: props.title,
        })
    }

    async fn get_all_values(&self, worksheet: &WorksheetHandle) -> SheetsResult<Grid> {
        let url = self.values_url(&worksheet.spreadsheet_id, &a1_range(&worksheet.title))?;
        let range: ValueRange = self.send(Method::GET, url, None).await?;
        Ok(range.values)
    }

    async fn clear(&self, worksheet: &WorksheetHandle) -> SheetsResult<()> {
        let range = format!("{}:clear", a1_range(&worksheet.title));
        let url = self.values_url(&worksheet.spreadsheet_id, &range)?;
        let _: IgnoredAny = self.send(Method::POST, url, Some(json!({}))).await?;
        Ok(())
    }

    async fn update(
        &self,
        worksheet: &WorksheetHandle,
        values: &[Vec<String>],
    ) -> SheetsResult<()> {
        let range = format!("{}!A1", a1_range(&worksheet.title));
        let mut url = self.values_url(&worksheet.spreadsheet_id, &range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });

        let _: IgnoredAny = self.send(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    async fn append_rows(
        &self,
        worksheet: &WorksheetHandle,
        rows: &[Vec<String>],
    ) -> SheetsResult<()> {
        let range = format!("{}!A1", a1_range(&worksheet.title));
        let mut url = self.values_url(&worksheet.spreadsheet_id, &format!("{}:append", range))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });

        let _: IgnoredAny = self.send(Method::POST, url, Some(body)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range_quotes_title() {
        assert_eq!(a1_range("data"), "'data'");
        assert_eq!(a1_range("it's"), "'it''s'");
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("O'Brien"), "O\\'Brien");
        assert_eq!(escape_query("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_sheet_url() {
        assert_eq!(sheet_url("abc"), "https://docs.google.com/spreadsheets/d/abc");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let segments = ["v4", "spreadsheets", "id", "values", "'my tab'!A1"];
        let url = endpoint("http://localhost:9000", &segments).unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/id/values/'my%20tab'!A1");

        let url = endpoint("http://localhost:9000/", &["drive", "v3", "files"]).unwrap();
        assert_eq!(url.path(), "/drive/v3/files");
    }

    #[test]
    fn test_api_error_mapping() {
        let body = concat!(
            r#"{"error":{"code":403,"message":"Caller lacks permission","#,
            r#""status":"PERMISSION_DENIED"}}"#
        );
        match api_error(403, body) {
            SheetsError::PermissionDenied(msg) => assert_eq!(msg, "Caller lacks permission"),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(api_error(401, ""), SheetsError::PermissionDenied(_)));

        match api_error(500, "") {
            SheetsError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "HTTP 500");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_value_range_without_values() {
        let body = r#"{"range":"'t'!A1:Z1000","majorDimension":"ROWS"}"#;
        let range: ValueRange = serde_json::from_str(body).unwrap();
        assert!(range.values.is_empty());
    }
}
