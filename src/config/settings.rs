use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::users::UserRegistry;
use crate::retry::RetryConfig;

/// 记账机器人：把 Telegram 中的 "名称 金额" 消息记录到 Google 表格
#[derive(Parser, Debug, Clone)]
#[command(name = "expensebot")]
#[command(about = "A Telegram bot that records expenses into a Google sheet", long_about = None)]
pub struct Settings {
    /// telegram bot token
    #[arg(long = "token", env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: String,

    /// filepath of google credentials
    #[arg(long, env = "GOOGLE_CREDENTIALS", default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// id of google sheet
    #[arg(long = "sheet", env = "SPREADSHEET_ID")]
    pub spreadsheet_id: String,

    /// name=id[,name=id] name,id pair of users
    #[arg(long, env = "EXPENSE_USERS")]
    pub users: String,

    /// name of admin user
    #[arg(long, env = "EXPENSE_ADMIN")]
    pub admin: String,

    /// where the google oauth token is cached
    #[arg(long, env = "GOOGLE_TOKEN_FILE", default_value = "token.json")]
    pub token_file: PathBuf,

    /// named range or table the rows are appended to
    #[arg(long, env = "SHEET_RANGE", default_value = "book")]
    pub range: String,

    /// retries after the first attempt for polling, sending and appending
    #[arg(long, env = "MAX_RETRY_ATTEMPTS", default_value_t = 4)]
    pub max_retries: u32,

    /// max updates per poll
    #[arg(long, env = "POLL_LIMIT", default_value_t = 10)]
    pub poll_limit: u8,

    /// long poll timeout in seconds
    #[arg(long, env = "POLL_TIMEOUT", default_value_t = 10)]
    pub poll_timeout: u32,
}

impl Settings {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.is_empty() {
            return Err(anyhow!("Telegram bot token cannot be empty"));
        }

        if self.spreadsheet_id.is_empty() {
            return Err(anyhow!("Spreadsheet id cannot be empty"));
        }

        if self.range.is_empty() {
            return Err(anyhow!("Sheet range cannot be empty"));
        }

        if self.poll_limit == 0 || self.poll_limit > 100 {
            return Err(anyhow!("Poll limit must be between 1 and 100"));
        }

        self.registry()?;
        Ok(())
    }

    pub fn registry(&self) -> Result<UserRegistry> {
        Ok(UserRegistry::parse(&self.users, &self.admin)?)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::with_max_retries(self.max_retries)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout as u64)
    }
}
