use log::{info, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::error::{ExpenseBotError, Result};
use crate::sheets::token::{OAuthToken, TokenResponse};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const AUTH_STATE: &str = "state-token";
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

#[derive(Debug, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// OAuth 客户端配置，来自 Google 的 credentials.json
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    pub fn from_credentials(credentials: &[u8], scopes: &[&str]) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_slice(credentials).map_err(|e| {
            ExpenseBotError::config(format!("could not parse client secret file to config: {e}"))
        })?;

        let secret = file.installed.or(file.web).ok_or_else(|| {
            ExpenseBotError::config("client secret file has neither \"installed\" nor \"web\" credentials")
        })?;

        let redirect_uri = secret.redirect_uris.into_iter().next().ok_or_else(|| {
            ExpenseBotError::config("missing redirect URL in the client credentials")
        })?;

        Ok(Self {
            client_id: secret.client_id,
            client_secret: secret.client_secret,
            auth_uri: secret.auth_uri,
            token_uri: secret.token_uri,
            redirect_uri,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// 用户需要在浏览器中打开的授权地址
    pub fn auth_code_url(&self, state: &str) -> Result<Url> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.auth_uri,
            [
                ("access_type", "offline"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| ExpenseBotError::config(format!("invalid auth uri {}: {e}", self.auth_uri)))
    }

    pub async fn exchange(&self, http: &Client, code: &str) -> Result<OAuthToken> {
        let response = self
            .request_token(
                http,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.redirect_uri.as_str()),
                ],
            )
            .await?;
        Ok(OAuthToken::from_response(response, ""))
    }

    pub async fn refresh(&self, http: &Client, token: &OAuthToken) -> Result<OAuthToken> {
        if token.refresh_token.is_empty() {
            return Err(ExpenseBotError::oauth("token expired and refresh token is not set"));
        }

        let response = self
            .request_token(
                http,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", token.refresh_token.as_str()),
                ],
            )
            .await?;
        Ok(OAuthToken::from_response(response, &token.refresh_token))
    }

    async fn request_token(&self, http: &Client, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        form.extend_from_slice(params);

        let response = http.post(&self.token_uri).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExpenseBotError::oauth(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

/// 持有当前 token，负责按需刷新并写回本地文件
#[derive(Debug)]
pub struct TokenManager {
    http: Client,
    config: OAuthConfig,
    token_file: PathBuf,
    token: RwLock<OAuthToken>,
}

impl TokenManager {
    pub fn new(http: Client, config: OAuthConfig, token_file: PathBuf, token: OAuthToken) -> Self {
        Self {
            http,
            config,
            token_file,
            token: RwLock::new(token),
        }
    }

    /// 优先读取缓存的 token，读取失败时走交互式授权（从标准输入读授权码）
    pub async fn bootstrap(http: Client, config: OAuthConfig, token_file: PathBuf) -> Result<Self> {
        let stdin = BufReader::new(tokio::io::stdin());
        Self::bootstrap_with(http, config, token_file, stdin).await
    }

    pub async fn bootstrap_with<R>(
        http: Client,
        config: OAuthConfig,
        token_file: PathBuf,
        input: R,
    ) -> Result<Self>
    where
        R: AsyncBufRead + Unpin,
    {
        let token = match OAuthToken::load(&token_file) {
            Ok(token) => {
                info!("Loaded cached token from {}", token_file.display());
                token
            }
            Err(e) => {
                info!("No usable cached token at {} ({e})", token_file.display());
                let token = token_from_web(&http, &config, input).await?;
                token.save(&token_file)?;
                token
            }
        };

        Ok(Self::new(http, config, token_file, token))
    }

    pub async fn current(&self) -> OAuthToken {
        self.token.read().await.clone()
    }

    /// 返回可用的 access token，过期时先刷新
    pub async fn access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        // 拿到写锁后再检查一次，并发的请求只会刷新一次
        let mut token = self.token.write().await;
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        info!("Access token expired, refreshing");
        Ok(self.refresh_locked(&mut token).await?.access_token)
    }

    pub async fn refresh(&self) -> Result<OAuthToken> {
        let mut token = self.token.write().await;
        self.refresh_locked(&mut token).await
    }

    /// 刷新和写文件都在写锁内完成，失败时保留旧 token
    async fn refresh_locked(&self, token: &mut OAuthToken) -> Result<OAuthToken> {
        let refreshed = self.config.refresh(&self.http, token).await?;
        refreshed.save(&self.token_file)?;

        *token = refreshed.clone();
        Ok(refreshed)
    }

    /// 后台定期刷新 token，失败只记录日志，下个周期再试
    pub fn spawn_auto_refresh(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                info!("refreshing token");
                if let Err(e) = self.refresh().await {
                    warn!("could not refresh token: {e}");
                }
            }
        })
    }
}

async fn token_from_web<R>(http: &Client, config: &OAuthConfig, mut input: R) -> Result<OAuthToken>
where
    R: AsyncBufRead + Unpin,
{
    let auth_url = config.auth_code_url(AUTH_STATE)?;
    println!(
        "Go to the following link in your browser then type the authorization code: \n{auth_url}"
    );

    let mut code = String::new();
    input.read_line(&mut code).await?;
    let code = code.trim();
    if code.is_empty() {
        return Err(ExpenseBotError::oauth("unable to read authorization code"));
    }

    config.exchange(http, code).await
}
