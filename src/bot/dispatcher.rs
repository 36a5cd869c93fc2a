use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::bot::handler::MessageHandler;
use crate::bot::traits::ChatApi;
use crate::error::Result;
use crate::models::IncomingUpdate;
use crate::retry::{retry_with_backoff, RetryConfig};

pub const DEFAULT_POLL_LIMIT: u8 = 10;
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// 下一次轮询的 offset：本批最大的 update id + 1，没有更新时不变
pub fn next_offset(offset: i32, updates: &[IncomingUpdate]) -> i32 {
    updates
        .iter()
        .map(|update| update.id.saturating_add(1))
        .max()
        .map_or(offset, |next| next.max(offset))
}

pub struct BotDispatcher {
    chat: Arc<dyn ChatApi>,
    handler: MessageHandler,
    retry: RetryConfig,
    poll_limit: u8,
    poll_timeout: Duration,
}

impl BotDispatcher {
    pub fn new(chat: Arc<dyn ChatApi>, handler: MessageHandler, retry: RetryConfig) -> Self {
        Self {
            chat,
            handler,
            retry,
            poll_limit: DEFAULT_POLL_LIMIT,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_polling(mut self, poll_limit: u8, poll_timeout: Duration) -> Self {
        self.poll_limit = poll_limit;
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn handler(&self) -> &MessageHandler {
        &self.handler
    }

    /// 轮询一次，每个更新交给一个独立任务处理，返回新的 offset 和这些任务
    pub async fn poll_once(&self, offset: i32) -> Result<(i32, Vec<JoinHandle<()>>)> {
        let updates = retry_with_backoff(
            || self.chat.get_updates(offset, self.poll_limit, self.poll_timeout),
            self.retry,
            "get updates",
        )
        .await?;

        if !updates.is_empty() {
            debug!("Received {} updates at offset {offset}", updates.len());
        }

        let next = next_offset(offset, &updates);
        let tasks = updates
            .into_iter()
            .filter_map(|update| update.message)
            .map(|message| {
                let handler = self.handler.clone();
                tokio::spawn(async move { handler.handle_message(&message).await })
            })
            .collect();

        Ok((next, tasks))
    }

    /// 一直轮询，只有在轮询重试耗尽时才返回错误
    pub async fn run(self) -> Result<()> {
        info!("🎯 Starting message processing...");

        let mut offset = 0;
        loop {
            let (next, _tasks) = self.poll_once(offset).await?;
            offset = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomingMessage;

    fn update(id: i32) -> IncomingUpdate {
        IncomingUpdate {
            id,
            message: Some(IncomingMessage {
                sender_id: 1,
                chat_id: 1,
                text: "tea 3".to_string(),
            }),
        }
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(0, &[]), 0);
        assert_eq!(next_offset(17, &[]), 17);
        assert_eq!(next_offset(0, &[update(10), update(11)]), 12);
        assert_eq!(next_offset(0, &[update(12), update(10)]), 13);
        assert_eq!(next_offset(20, &[update(5)]), 20);
    }
}
