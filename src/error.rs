use teloxide::RequestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpenseBotError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("unknown user {user_id}")]
    UnknownUser { user_id: i64 },

    #[error("invalid message: {message}")]
    MalformedInput { message: String },

    #[error("Telegram API error: {0}")]
    Telegram(#[from] RequestError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error ({status}): {body}")]
    Sheets { status: u16, body: String },

    #[error("OAuth error: {message}")]
    OAuth { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExpenseBotError>;

impl ExpenseBotError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn unknown_user(user_id: i64) -> Self {
        Self::UnknownUser { user_id }
    }

    pub fn malformed_input(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    pub fn oauth(message: impl Into<String>) -> Self {
        Self::OAuth {
            message: message.into(),
        }
    }

    /// 按消息处理的错误：只影响当前这一条更新，需要报告给管理员
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            ExpenseBotError::UnknownUser { .. } | ExpenseBotError::MalformedInput { .. }
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ExpenseBotError::Config { .. } => ErrorSeverity::Critical,
            ExpenseBotError::UnknownUser { .. } => ErrorSeverity::Low,
            ExpenseBotError::MalformedInput { .. } => ErrorSeverity::Low,
            ExpenseBotError::Telegram(_) => ErrorSeverity::Medium,
            ExpenseBotError::Http(_) => ErrorSeverity::Medium,
            ExpenseBotError::Sheets { .. } => ErrorSeverity::High,
            ExpenseBotError::OAuth { .. } => ErrorSeverity::High,
            ExpenseBotError::Io(_) => ErrorSeverity::Medium,
            ExpenseBotError::Json(_) => ErrorSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ExpenseBotError::unknown_user(42).to_string(),
            "unknown user 42"
        );
        assert_eq!(
            ExpenseBotError::malformed_input("taxi").to_string(),
            "invalid message: taxi"
        );
        assert_eq!(
            ExpenseBotError::Sheets {
                status: 403,
                body: "denied".to_string()
            }
            .to_string(),
            "Sheets API error (403): denied"
        );
    }

    #[test]
    fn test_per_message_errors() {
        assert!(ExpenseBotError::unknown_user(1).is_per_message());
        assert!(ExpenseBotError::malformed_input("x").is_per_message());
        assert!(!ExpenseBotError::config("x").is_per_message());
        assert_eq!(ExpenseBotError::config("x").severity(), ErrorSeverity::Critical);
    }
}
