use anyhow::{Context, Result};
use dotenv::dotenv;
use log::info;
use std::sync::Arc;

use expensebot::bot::{BotDispatcher, MessageHandler, TelegramChat};
use expensebot::config::Settings;
use expensebot::parser::ExpenseParser;
use expensebot::sheets::auth::REFRESH_INTERVAL;
use expensebot::sheets::SheetsClient;
use expensebot::utils::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv().ok();

    // 初始化日志
    env_logger::init();

    Logger::log_operation_start("ExpenseBot", "Initializing application");

    // 加载并验证配置
    let settings = Settings::new();
    if let Err(e) = settings.validate() {
        Logger::log_operation_failure("Configuration validation", &e.to_string());
        return Err(e);
    }
    let users = settings.registry()?;
    Logger::log_operation_success(
        "Configuration",
        &format!("{} users, admin id {}", users.len(), users.admin()),
    );

    // 初始化表格客户端
    let credentials = std::fs::read(&settings.credentials).with_context(|| {
        format!(
            "Unable to read client secret file {}",
            settings.credentials.display()
        )
    })?;
    let sheet = SheetsClient::connect(
        &credentials,
        settings.token_file.clone(),
        settings.spreadsheet_id.clone(),
    )
    .await
    .context("could not create sheets client")?
    .with_range(settings.range.clone());
    sheet.auth().clone().spawn_auto_refresh(REFRESH_INTERVAL);
    Logger::log_operation_success("Sheets", "Sheets client initialized successfully");

    // 创建Bot实例
    let chat = TelegramChat::connect(&settings.telegram_bot_token, settings.poll_timeout())
        .await
        .context("Bot connection failed")?;
    Logger::log_operation_success("TelegramBot", "Bot instance created successfully");

    info!("📊 Configuration:");
    info!("  - Spreadsheet: {}", settings.spreadsheet_id);
    info!("  - Range: {}", settings.range);
    info!("  - Max Retry Attempts: {}", settings.max_retries);
    info!("  - Poll Timeout: {}s", settings.poll_timeout);

    let chat = Arc::new(chat);
    let handler = MessageHandler::new(
        chat.clone(),
        Arc::new(sheet),
        ExpenseParser::new(users),
        settings.retry_config(),
    );

    BotDispatcher::new(chat, handler, settings.retry_config())
        .with_polling(settings.poll_limit, settings.poll_timeout())
        .run()
        .await
        .context("could not get updates")?;

    Ok(())
}
