use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use super::{CellRange, SheetBackend, SheetDetails, StoreError, StoreResult};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const TOKEN_LIFETIME: Duration = Duration::from_secs(3600);
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Service-account identity and target spreadsheet.
#[derive(Clone)]
pub struct SheetsCredentials {
    pub service_account_email: String,
    pub private_key: String,
    pub spreadsheet_id: String,
}

impl std::fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsCredentials")
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &"<redacted>")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish()
    }
}

impl SheetsCredentials {
    /// Builds credentials only when all three values are present and
    /// non-empty. Literal `\n` sequences in the key become newlines, as
    /// keys pasted into a single-line env var usually carry them.
    pub fn from_parts(
        service_account_email: Option<String>,
        private_key: Option<String>,
        spreadsheet_id: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Some(Self {
            service_account_email: non_empty(service_account_email)?,
            private_key: non_empty(private_key)?.replace("\\n", "\n"),
            spreadsheet_id: non_empty(spreadsheet_id)?,
        })
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

#[derive(Deserialize)]
struct Sheet {
    properties: Option<SheetProperties>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: Option<i64>,
    title: Option<String>,
}

/// Google Sheets v4 backend authenticated as a service account.
///
/// Without credentials every call fails with `MissingCredentials`, so the
/// service still starts and reports the problem per request.
pub struct GoogleSheets {
    client: reqwest::Client,
    credentials: Option<SheetsCredentials>,
    sheets_api: String,
    token_url: String,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheets {
    pub fn new(credentials: Option<SheetsCredentials>) -> Self {
        Self::with_endpoints(credentials, SHEETS_API, TOKEN_URL)
    }

    /// Talks to `sheets_api` (the `.../v4/spreadsheets` collection) and
    /// exchanges tokens at `token_url` instead of the Google endpoints.
    pub fn with_endpoints(
        credentials: Option<SheetsCredentials>,
        sheets_api: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        if credentials.is_none() {
            tracing::warn!("Google Sheets credentials are not configured");
        }
        Self {
            client: reqwest::Client::new(),
            credentials,
            sheets_api: sheets_api.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
            token: Mutex::new(None),
        }
    }

    fn credentials(&self) -> StoreResult<&SheetsCredentials> {
        self.credentials
            .as_ref()
            .ok_or(StoreError::MissingCredentials)
    }

    fn spreadsheet_url(&self, suffix: &str) -> StoreResult<Url> {
        let creds = self.credentials()?;
        Url::parse(&format!(
            "{}/{}{suffix}",
            self.sheets_api, creds.spreadsheet_id
        ))
            .map_err(StoreError::backend)
    }

    /// `.../values/{range}{suffix}` with the range percent-encoded as one
    /// path segment.
    fn values_url(&self, range: &CellRange, suffix: &str) -> StoreResult<Url> {
        let mut url = self.spreadsheet_url("")?;
        url.path_segments_mut()
            .map_err(|_| StoreError::backend("spreadsheet url cannot be a base"))?
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    fn signed_assertion(creds: &SheetsCredentials, audience: &str) -> StoreResult<String> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(StoreError::backend)?
            .as_secs();
        let claims = Claims {
            iss: &creds.service_account_email,
            scope: SCOPE,
            aud: audience,
            iat,
            exp: iat + TOKEN_LIFETIME.as_secs(),
        };
        let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
            .map_err(|e| StoreError::Backend(format!("invalid service account key: {e}")))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(StoreError::backend)
    }

    async fn access_token(&self) -> StoreResult<String> {
        let creds = self.credentials()?;
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let assertion = Self::signed_assertion(creds, &self.token_url)?;
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(StoreError::backend)?;
        let token: TokenResponse = Self::read_json(resp).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "fetched sheets access token");
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> StoreResult<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::error!("Sheets API error: {status} - {text}");
            return Err(StoreError::Backend(format!("Sheets API returned {status}")));
        }
        resp.json().await.map_err(StoreError::backend)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> StoreResult<T> {
        let token = self.access_token().await?;
        let resp = req
            .bearer_auth(token)
            .send()
            .await
            .map_err(StoreError::backend)?;
        Self::read_json(resp).await
    }
}

impl SheetBackend for GoogleSheets {
    async fn sheet_details(&self) -> StoreResult<SheetDetails> {
        let mut url = self.spreadsheet_url("")?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let spreadsheet: Spreadsheet = self.send(self.client.get(url)).await?;

        let properties = spreadsheet
            .sheets
            .into_iter()
            .next()
            .and_then(|sheet| sheet.properties)
            .ok_or_else(|| StoreError::backend("No sheets found in the spreadsheet"))?;
        Ok(SheetDetails {
            title: properties.title.unwrap_or_else(|| "Sheet1".to_string()),
            sheet_id: properties.sheet_id.unwrap_or(0),
        })
    }

    async fn get_values(&self, range: &CellRange) -> StoreResult<Vec<Vec<String>>> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut()
            .append_pair("majorDimension", "ROWS")
            .append_pair("valueRenderOption", "FORMATTED_VALUE");
        let body: ValueRange = self.send(self.client.get(url)).await?;
        Ok(body.values)
    }

    async fn append_rows(&self, range: &CellRange, rows: Vec<Vec<String>>) -> StoreResult<()> {
        let mut url = self.values_url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        let _: serde_json::Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn update_values(&self, range: &CellRange, rows: Vec<Vec<String>>) -> StoreResult<()> {
        let mut url = self.values_url(range, "")?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        let body = json!({
            "range": range.to_string(),
            "majorDimension": "ROWS",
            "values": rows,
        });
        let _: serde_json::Value = self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn delete_rows(&self, sheet_id: i64, first: u32, last: u32) -> StoreResult<()> {
        let url = self.spreadsheet_url(":batchUpdate")?;
        let body = json!({
            "requests": [{
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": first.saturating_sub(1),
                        "endIndex": last,
                    }
                }
            }]
        });
        let _: serde_json::Value = self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}
