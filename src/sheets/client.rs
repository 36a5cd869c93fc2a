use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::bot::traits::ExpenseSink;
use crate::error::{ExpenseBotError, Result};
use crate::sheets::auth::{OAuthConfig, TokenManager, SPREADSHEETS_SCOPE};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_RANGE: &str = "book";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    table_range: Option<String>,
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: Option<String>,
}

/// Google Sheets 客户端，只支持向某个区域追加行
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    range: String,
    auth: Arc<TokenManager>,
}

impl SheetsClient {
    pub fn new(http: Client, auth: Arc<TokenManager>, spreadsheet_id: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(SHEETS_BASE_URL)
            .map_err(|e| ExpenseBotError::config(format!("invalid sheets url: {e}")))?;

        Ok(Self {
            http,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            range: DEFAULT_RANGE.to_string(),
            auth,
        })
    }

    /// 从 credentials.json 的内容启动：读取或交互获取 token
    pub async fn connect(
        credentials: &[u8],
        token_file: PathBuf,
        spreadsheet_id: impl Into<String>,
    ) -> Result<Self> {
        let config = OAuthConfig::from_credentials(credentials, &[SPREADSHEETS_SCOPE])?;
        let http = Client::new();
        let auth = TokenManager::bootstrap(http.clone(), config, token_file).await?;
        Self::new(http, Arc::new(auth), spreadsheet_id)
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| ExpenseBotError::config(format!("invalid sheets url {base_url}: {e}")))?;
        Ok(self)
    }

    pub fn auth(&self) -> &Arc<TokenManager> {
        &self.auth
    }

    fn append_url(&self) -> Result<Url> {
        let append_segment = format!("{}:append", self.range);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ExpenseBotError::config(format!("invalid sheets url: {}", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                append_segment.as_str(),
            ]);
        Ok(url)
    }

    /// 以 RAW + INSERT_ROWS 方式追加一行
    pub async fn append(&self, values: Vec<Value>) -> Result<()> {
        let access_token = self.auth.access_token().await?;
        let body = json!({ "values": [values] });

        let response = self
            .http
            .post(self.append_url()?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExpenseBotError::Sheets {
                status: status.as_u16(),
                body,
            });
        }

        match response.json::<AppendResponse>().await {
            Ok(appended) => info!(
                "Appended row to {} (table {})",
                appended
                    .updates
                    .and_then(|u| u.updated_range)
                    .unwrap_or_else(|| self.range.clone()),
                appended.table_range.unwrap_or_default()
            ),
            Err(e) => debug!("Could not decode append response: {e}"),
        }

        Ok(())
    }
}

#[async_trait]
impl ExpenseSink for SheetsClient {
    async fn append(&self, values: Vec<Value>) -> Result<()> {
        SheetsClient::append(self, values).await
    }
}
