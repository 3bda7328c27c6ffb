//! Google Sheets v4 `values` API adapter.
//!
//! Only A1 ranges on a single worksheet are used. HTTP failures are mapped
//! onto [`StoreError`] so the retry policy can tell quota errors apart from
//! outages and permanent rejections.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use roster_domain::{encode_flag, CellRef, CellUpdate, SheetBinding, SheetClient, StoreError};

use crate::config::SheetsSettings;

// Values are stored verbatim; identities must read back unchanged.
const VALUE_INPUT_OPTION: &str = "RAW";
const MAX_ERROR_BODY: usize = 300;

pub struct SheetsHttpClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    worksheet: String,
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteRange {
    range: String,
    major_dimension: &'static str,
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdate {
    value_input_option: &'static str,
    data: Vec<WriteRange>,
}

impl SheetsHttpClient {
    pub fn new(settings: &SheetsSettings, binding: &SheetBinding) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        let base_url = Url::parse(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("sheets_base_url '{}' cannot be used as a base", settings.base_url);
        }
        Ok(Self {
            client,
            base_url,
            spreadsheet_id: binding.spreadsheet_id.clone(),
            worksheet: binding.worksheet.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    /// Fetches spreadsheet metadata; used by the readiness probe.
    pub async fn check(&self) -> Result<(), StoreError> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut().append_pair("fields", "spreadsheetId");
        self.send(self.client.get(url)).await?;
        Ok(())
    }

    fn range(&self, a1: &str) -> String {
        quoted_range(&self.worksheet, a1)
    }

    fn url(&self, tail: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Rejected("invalid sheets base url".to_string()))?;
            segments.pop_if_empty();
            segments.push("spreadsheets");
            segments.push(&self.spreadsheet_id);
            segments.extend(tail);
        }
        Ok(url)
    }

    async fn get_range(&self, a1: &str, major_dimension: &str) -> Result<ValueRange, StoreError> {
        let range = self.range(a1);
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("majorDimension", major_dimension);
        let response = self.send(self.client.get(url)).await?;
        response
            .json::<ValueRange>()
            .await
            .map_err(|err| StoreError::Rejected(format!("malformed values response: {}", err)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %truncate(&body), "sheets request failed");
        Err(classify_status(status, &body))
    }
}

#[async_trait]
impl SheetClient for SheetsHttpClient {
    async fn get_cell(&self, cell: &CellRef) -> Result<String, StoreError> {
        let range = self.get_range(&cell.to_string(), "ROWS").await?;
        Ok(range
            .values
            .first()
            .and_then(|row| row.first())
            .map(cell_text)
            .unwrap_or_default())
    }

    async fn get_column(&self, column: &str) -> Result<Vec<String>, StoreError> {
        let a1 = format!("{0}:{0}", column.trim().to_uppercase());
        let range = self.get_range(&a1, "COLUMNS").await?;
        Ok(range
            .values
            .into_iter()
            .next()
            .map(|column| column.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    async fn set_cell(&self, cell: &CellRef, value: &str) -> Result<(), StoreError> {
        let range = self.range(&cell.to_string());
        let mut url = self.url(&["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", VALUE_INPUT_OPTION);
        let body = WriteRange {
            range,
            major_dimension: "ROWS",
            values: vec![vec![value.to_string()]],
        };
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn set_cells(&self, updates: &[CellUpdate]) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        let url = self.url(&["values:batchUpdate"])?;
        let body = BatchUpdate {
            value_input_option: VALUE_INPUT_OPTION,
            data: updates
                .iter()
                .map(|update| WriteRange {
                    range: self.range(&update.cell.to_string()),
                    major_dimension: "ROWS",
                    values: vec![vec![update.value.clone()]],
                })
                .collect(),
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

fn quoted_range(worksheet: &str, a1: &str) -> String {
    format!("'{}'!{}", worksheet.replace('\'', "''"), a1)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(flag) => encode_flag(*flag).to_string(),
        other => other.to_string(),
    }
}

fn classify_status(status: StatusCode, body: &str) -> StoreError {
    let detail = format!("{} {}", status.as_u16(), truncate(body));
    let lowered = body.to_ascii_lowercase();
    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("rate_limit_exceeded")
        || lowered.contains("quota")
    {
        return StoreError::RateLimited(detail);
    }
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return StoreError::Transient(detail);
    }
    StoreError::Rejected(detail)
}

fn classify_transport(err: reqwest::Error) -> StoreError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        StoreError::Transient(err.to_string())
    } else {
        StoreError::Rejected(err.to_string())
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
