use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;
use crate::models::IncomingUpdate;

/// 抽象聊天 API 的 trait，用于测试时mock
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// 长轮询获取 offset 之后的更新
    async fn get_updates(&self, offset: i32, limit: u8, timeout: Duration) -> Result<Vec<IncomingUpdate>>;

    /// 发送消息
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// 记录的去处，生产环境是 Google 表格
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExpenseSink: Send + Sync {
    /// 追加一行，不在这一层重试
    async fn append(&self, values: Vec<Value>) -> Result<()>;
}
