use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 中国没有夏令时，固定使用 UTC+8
pub const BEIJING_OFFSET_SECONDS: i64 = 8 * 3600;
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 一条解析后的开销记录，写入表格后即丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub label: String,
    pub amount: f64,
    pub spender: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

impl Expense {
    pub fn new(label: impl Into<String>, amount: f64, spender: impl Into<String>) -> Self {
        Self::at(label, amount, spender, Utc::now())
    }

    pub fn at(
        label: impl Into<String>,
        amount: f64,
        spender: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            label: label.into(),
            amount,
            spender: spender.into(),
            category: String::new(),
            timestamp,
        }
    }

    pub fn formatted_timestamp(&self) -> String {
        let beijing = self.timestamp.naive_utc() + Duration::seconds(BEIJING_OFFSET_SECONDS);
        beijing.format(TIME_FORMAT).to_string()
    }

    /// 表格中的一行：名称、金额、花费人、分类、时间
    pub fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.label.clone()),
            Value::from(self.amount),
            Value::from(self.spender.clone()),
            Value::from(self.category.clone()),
            Value::from(self.formatted_timestamp()),
        ]
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} spent {:.2} on {}", self.spender, self.amount, self.label)
    }
}

/// 轮询得到的一个更新；非文本消息的更新也要推进 offset
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingUpdate {
    pub id: i32,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub sender_id: i64,
    pub chat_id: i64,
    pub text: String,
}
