use crate::auth::Authenticator;
use crate::config::ServiceAccountKey;
use crate::debug_println;
use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// One worksheet (tab) of a spreadsheet. Rows and columns are 1-based.
pub trait SheetTab {
    fn title(&self) -> &str;

    /// Size of the sheet grid, including blank rows.
    fn row_count(&self) -> usize;

    fn row_values(&self, row: usize) -> Result<Vec<String>>;

    fn cell(&self, row: usize, col: usize) -> Result<Option<String>>;

    fn append_row(&mut self, values: &[String]) -> Result<()>;

    fn update_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()>;
}

/// Writes every name in `expected` that is missing from the header row into
/// the next free column. Returns the names that were added.
pub fn ensure_headers<S: SheetTab + ?Sized>(sheet: &mut S, expected: &[&str]) -> Result<Vec<String>> {
    let header = sheet
        .row_values(1)
        .with_context(|| format!("Failed to read header row of '{}'", sheet.title()))?;

    let mut next_col = header.len() + 1;
    let mut added = Vec::new();

    for name in expected {
        if header.iter().any(|h| h == name) {
            continue;
        }
        sheet.update_cell(1, next_col, name)?;
        debug_println!("Added header '{}' at column {}", name, column_letters(next_col));
        added.push(name.to_string());
        next_col += 1;
    }

    Ok(added)
}

/// 1 -> A, 26 -> Z, 27 -> AA.
pub fn column_letters(col: usize) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn quoted_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

pub fn cell_range(title: &str, row: usize, col: usize) -> String {
    format!("{}!{}{}", quoted_title(title), column_letters(col), row)
}

pub fn row_range(title: &str, row: usize) -> String {
    format!("{}!{}:{}", quoted_title(title), row, row)
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    title: String,
    #[serde(default)]
    grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProperties {
    #[serde(default)]
    row_count: usize,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl ValueRange {
    fn first_row(self) -> Vec<String> {
        self.values
            .into_iter()
            .next()
            .map(|row| row.iter().map(value_to_string).collect())
            .unwrap_or_default()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct SheetsClient {
    http: Client,
    auth: Authenticator,
}

impl SheetsClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Sheets HTTP client")?;
        let auth = Authenticator::new(key, http.clone())?;
        Ok(Self { http, auth })
    }

    pub fn service_account(&self) -> &str {
        self.auth.client_email()
    }

    /// Opens the first spreadsheet visible to the service account with this exact name.
    pub fn open(&self, name: &str) -> Result<Spreadsheet<'_>> {
        let query = drive_query(name);
        let list: DriveFileList = self
            .send(
                self.http.get(DRIVE_FILES_URL).query(&[
                    ("q", query.as_str()),
                    ("fields", "files(id,name)"),
                    ("supportsAllDrives", "true"),
                    ("includeItemsFromAllDrives", "true"),
                ]),
            )
            .with_context(|| format!("Failed to look up spreadsheet '{}'", name))?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| anyhow!("Spreadsheet '{}' not found or not shared with {}", name, self.service_account()))?;

        debug_println!("Opened spreadsheet '{}' ({})", name, id);
        Ok(Spreadsheet {
            client: self,
            id,
            name: name.to_string(),
        })
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let token = self.auth.access_token()?;
        let response = request
            .bearer_auth(token)
            .send()
            .context("Request to Google API failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("Google API returned {}: {}", status, body.trim()));
        }

        response.json().context("Failed to parse Google API response")
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            SHEETS_URL,
            spreadsheet_id,
            urlencoding::encode(range)
        )
    }
}

pub struct Spreadsheet<'c> {
    client: &'c SheetsClient,
    id: String,
    name: String,
}

impl<'c> Spreadsheet<'c> {
    pub fn worksheet(&self, title: &str) -> Result<Worksheet<'c>> {
        let url = format!("{}/{}", SHEETS_URL, self.id);
        let meta: SpreadsheetMeta = self
            .client
            .send(self.client.http.get(url).query(&[("fields", "sheets.properties")]))
            .with_context(|| format!("Failed to read worksheets of '{}'", self.name))?;

        let properties = meta
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == title)
            .ok_or_else(|| anyhow!("Worksheet '{}' not found in '{}'", title, self.name))?;

        Ok(Worksheet {
            client: self.client,
            spreadsheet_id: self.id.clone(),
            title: properties.title,
            row_count: properties.grid_properties.map(|g| g.row_count).unwrap_or(0),
        })
    }
}

pub struct Worksheet<'c> {
    client: &'c SheetsClient,
    spreadsheet_id: String,
    title: String,
    row_count: usize,
}

impl Worksheet<'_> {
    fn get_range(&self, range: &str) -> Result<ValueRange> {
        let url = self.client.values_url(&self.spreadsheet_id, range);
        self.client
            .send(self.client.http.get(url).query(&[("majorDimension", "ROWS")]))
            .with_context(|| format!("Failed to read {}", range))
    }
}

impl SheetTab for Worksheet<'_> {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn row_values(&self, row: usize) -> Result<Vec<String>> {
        Ok(self.get_range(&row_range(&self.title, row))?.first_row())
    }

    fn cell(&self, row: usize, col: usize) -> Result<Option<String>> {
        let values = self.get_range(&cell_range(&self.title, row, col))?.first_row();
        Ok(values.into_iter().next())
    }

    fn append_row(&mut self, values: &[String]) -> Result<()> {
        let range = cell_range(&self.title, 1, 1);
        let url = format!("{}:append", self.client.values_url(&self.spreadsheet_id, &range));
        let _: Value = self
            .client
            .send(
                self.client
                    .http
                    .post(url)
                    .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                    .json(&json!({ "majorDimension": "ROWS", "values": [values] })),
            )
            .with_context(|| format!("Failed to append row to '{}'", self.title))?;
        Ok(())
    }

    fn update_cell(&mut self, row: usize, col: usize, value: &str) -> Result<()> {
        let range = cell_range(&self.title, row, col);
        let url = self.client.values_url(&self.spreadsheet_id, &range);
        let _: Value = self
            .client
            .send(
                self.client
                    .http
                    .put(url)
                    .query(&[("valueInputOption", "USER_ENTERED")])
                    .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [[value]] })),
            )
            .with_context(|| format!("Failed to write {}", range))?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemorySheet;
    use super::*;
    use crate::models::RESULT_COLUMNS;

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(2), "B");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(702), "ZZ");
        assert_eq!(column_letters(703), "AAA");
    }

    #[test]
    fn ranges_quote_titles() {
        assert_eq!(cell_range("Criteria", 3, 2), "'Criteria'!B3");
        assert_eq!(row_range("results", 1), "'results'!1:1");
        assert_eq!(cell_range("Bob's cars", 1, 1), "'Bob''s cars'!A1");
    }

    #[test]
    fn drive_query_escapes_quotes() {
        assert_eq!(
            drive_query("CarSearch"),
            "name = 'CarSearch' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
        assert!(drive_query("Bob's").starts_with("name = 'Bob\\'s'"));
    }

    #[test]
    fn value_range_first_row_stringifies() {
        let vr: ValueRange = serde_json::from_value(json!({
            "range": "'results'!1:1",
            "majorDimension": "ROWS",
            "values": [["Title", 42, true, null]]
        }))
        .unwrap();
        assert_eq!(vr.first_row(), vec!["Title", "42", "true", ""]);

        let empty: ValueRange = serde_json::from_value(json!({ "range": "'results'!1:1" })).unwrap();
        assert!(empty.first_row().is_empty());
    }

    #[test]
    fn worksheet_properties_parse() {
        let meta: SpreadsheetMeta = serde_json::from_value(json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "results", "gridProperties": { "rowCount": 1000, "columnCount": 26 } } },
                { "properties": { "sheetId": 7, "title": "Criteria", "gridProperties": { "rowCount": 11, "columnCount": 2 } } }
            ]
        }))
        .unwrap();
        let criteria = &meta.sheets[1].properties;
        assert_eq!(criteria.title, "Criteria");
        assert_eq!(criteria.grid_properties.as_ref().unwrap().row_count, 11);
    }

    #[test]
    fn headers_written_into_empty_sheet() {
        let mut sheet = MemorySheet::new("results", vec![]);
        let added = ensure_headers(&mut sheet, &RESULT_COLUMNS).unwrap();

        assert_eq!(added.len(), 12);
        assert_eq!(sheet.rows[0], RESULT_COLUMNS.to_vec());
    }

    #[test]
    fn missing_headers_go_to_successive_free_columns() {
        let mut sheet = MemorySheet::new(
            "results",
            vec![vec!["Title", "Price", "Dealer Name", "Mileage", "Miles From", "Link", "History Report"]],
        );
        let added = ensure_headers(&mut sheet, &RESULT_COLUMNS).unwrap();

        assert_eq!(added, vec!["Color", "Interior Color", "Phone", "VIN", "Stock #"]);
        assert_eq!(sheet.rows[0], RESULT_COLUMNS.to_vec());
        assert_eq!(sheet.writes, 5);
    }

    #[test]
    fn existing_headers_are_left_alone() {
        let mut sheet = MemorySheet::new("results", vec![vec!["Notes", "Title", "VIN"]]);
        ensure_headers(&mut sheet, &RESULT_COLUMNS).unwrap();

        assert_eq!(&sheet.rows[0][..3], &["Notes", "Title", "VIN"]);
        assert_eq!(sheet.rows[0].len(), 3 + 10);
    }

    #[test]
    fn header_check_is_idempotent() {
        let mut sheet = MemorySheet::new("results", vec![]);
        ensure_headers(&mut sheet, &RESULT_COLUMNS).unwrap();
        let writes_after_first = sheet.writes;

        let added = ensure_headers(&mut sheet, &RESULT_COLUMNS).unwrap();
        assert!(added.is_empty());
        assert_eq!(sheet.writes, writes_after_first);
    }
}
