use async_trait::async_trait;
use log::info;
use std::time::Duration;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;

use crate::bot::traits::ChatApi;
use crate::error::Result;
use crate::models::{IncomingMessage, IncomingUpdate};

/// HTTP 超时要比长轮询的超时更长
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// 基于 teloxide 的 Telegram 客户端
#[derive(Clone, Debug)]
pub struct TelegramChat {
    bot: Bot,
}

impl TelegramChat {
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(poll_timeout + REQUEST_TIMEOUT_MARGIN)
            .build()?;

        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }

    /// 创建客户端并用 getMe 检查 token
    pub async fn connect(token: &str, poll_timeout: Duration) -> Result<Self> {
        let chat = Self::new(token, poll_timeout)?;

        let me = chat.bot.get_me().await?;
        info!("✅ Bot connected successfully:");
        info!("  - Username: @{}", me.username());
        info!("  - Name: {}", me.first_name);
        info!("  - ID: {}", me.id);

        Ok(chat)
    }
}

fn to_incoming(update: Update) -> IncomingUpdate {
    let message = match &update.kind {
        UpdateKind::Message(message) => match (message.from(), message.text()) {
            (Some(user), Some(text)) => Some(IncomingMessage {
                sender_id: user.id.0 as i64,
                chat_id: message.chat.id.0,
                text: text.to_string(),
            }),
            _ => None,
        },
        _ => None,
    };

    IncomingUpdate {
        id: update.id,
        message,
    }
}

#[async_trait]
impl ChatApi for TelegramChat {
    async fn get_updates(&self, offset: i32, limit: u8, timeout: Duration) -> Result<Vec<IncomingUpdate>> {
        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .limit(limit)
            .timeout(timeout.as_secs() as u32)
            .await?;

        Ok(updates.into_iter().map(to_incoming).collect())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}
