use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Header-row column names the summary and log views depend on.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";
pub const MOOD_COLUMN: &str = "Mood";
pub const NOTE_COLUMN: &str = "Note";

const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const OAUTH_SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Treat a token as stale this long before the store would.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// One sheet row, keyed by the header row's column names.
pub type Record = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
}

/// Service-account credential bundle supplied by the hosting environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, SheetError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SheetError::Authentication(format!("reading {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| SheetError::Authentication(format!("malformed credential bundle: {e}")))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

struct BearerToken {
    value: String,
    expires_at: Instant,
}

/// Authenticated handle to one worksheet, constructed once per process and
/// passed by reference to whatever needs the store.
pub struct SheetClient {
    http: Client,
    credentials: Credentials,
    spreadsheet_id: String,
    worksheet: String,
    token: Option<BearerToken>,
}

impl SheetClient {
    /// Opens the handle and performs the initial token exchange, so a bad
    /// credential bundle fails here rather than on first use.
    pub fn connect(
        credentials: Credentials,
        spreadsheet_id: String,
        worksheet: String,
    ) -> Result<Self, SheetError> {
        let mut client = SheetClient {
            http: Client::new(),
            credentials,
            spreadsheet_id,
            worksheet,
            token: None,
        };
        client.refresh_token()?;
        Ok(client)
    }

    /// Appends one row of ordered cell values at the end of the worksheet.
    /// No validation; trusts the caller to match the column order.
    pub fn append(&mut self, row: &[String]) -> Result<(), SheetError> {
        let token = self.bearer()?;
        let url = format!(
            "{SHEETS_ENDPOINT}/{}/values/{}:append",
            self.spreadsheet_id, self.worksheet
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .map_err(|e| SheetError::RemoteUnavailable(e.to_string()))?;
        check_status(response.status())?;
        debug!("appended row to remote store");
        Ok(())
    }

    /// Reads every data row since the sheet's creation, in stored order.
    /// A header-only or empty sheet yields an empty sequence.
    pub fn read_all(&mut self) -> Result<Vec<Record>, SheetError> {
        let token = self.bearer()?;
        let url = format!(
            "{SHEETS_ENDPOINT}/{}/values/{}",
            self.spreadsheet_id, self.worksheet
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .map_err(|e| SheetError::RemoteUnavailable(e.to_string()))?;
        check_status(response.status())?;
        let range: ValueRange = response
            .json()
            .map_err(|e| SheetError::RemoteUnavailable(format!("malformed store response: {e}")))?;
        Ok(records_from_values(range.values))
    }

    fn bearer(&mut self) -> Result<String, SheetError> {
        if let Some(token) = &self.token {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }
        self.refresh_token()
    }

    /// Exchanges a signed JWT assertion for a bearer token and caches it
    /// until shortly before expiry.
    fn refresh_token(&mut self) -> Result<String, SheetError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.credentials.client_email,
            scope: OAUTH_SCOPES,
            aud: &self.credentials.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| SheetError::Authentication(format!("invalid private key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetError::Authentication(format!("signing token request: {e}")))?;

        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", &assertion)])
            .send()
            .map_err(|e| SheetError::RemoteUnavailable(format!("token endpoint: {e}")))?;
        if !response.status().is_success() {
            return Err(SheetError::Authentication(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let token: TokenResponse = response
            .json()
            .map_err(|e| SheetError::Authentication(format!("malformed token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        self.token = Some(BearerToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        debug!("authorized against remote store");
        Ok(token.access_token)
    }
}

fn check_status(status: StatusCode) -> Result<(), SheetError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(SheetError::Authentication(format!("store returned {status}")))
    } else {
        Err(SheetError::RemoteUnavailable(format!("store returned {status}")))
    }
}

/// Zips the header row onto each data row. Short rows are padded with empty
/// cells, the way the store reports trailing blanks.
fn records_from_values(values: Vec<Vec<String>>) -> Vec<Record> {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    rows.map(|row| {
        header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn records_keyed_by_header_row() {
        let records = records_from_values(values(&[
            &["Timestamp", "Mood", "Note"],
            &["2024-05-01 09:30:00", "😊", "standup went well"],
        ]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0][TIMESTAMP_COLUMN], "2024-05-01 09:30:00");
        assert_eq!(records[0][MOOD_COLUMN], "😊");
        assert_eq!(records[0][NOTE_COLUMN], "standup went well");
    }

    #[test]
    fn short_rows_padded_with_empty_cells() {
        let records = records_from_values(values(&[
            &["Timestamp", "Mood", "Note"],
            &["2024-05-01 09:30:00", "😐"],
        ]));
        assert_eq!(records[0][NOTE_COLUMN], "");
    }

    #[test]
    fn empty_and_header_only_sheets_yield_no_records() {
        assert!(records_from_values(Vec::new()).is_empty());
        assert!(records_from_values(values(&[&["Timestamp", "Mood", "Note"]])).is_empty());
    }

    #[test]
    fn auth_statuses_map_to_authentication_errors() {
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN),
            Err(SheetError::Authentication(_))
        ));
        assert!(matches!(
            check_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(SheetError::RemoteUnavailable(_))
        ));
        assert!(check_status(StatusCode::OK).is_ok());
    }

    #[test]
    fn credentials_default_token_uri() {
        let creds: Credentials = serde_json::from_str(
            r#"{"client_email": "bot@example.iam.gserviceaccount.com", "private_key": "---"}"#,
        )
        .unwrap();
        assert_eq!(creds.token_uri, DEFAULT_TOKEN_URI);
    }
}
