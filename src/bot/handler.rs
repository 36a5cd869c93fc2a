use futures::future::join_all;
use log::{debug, error, warn};
use std::sync::Arc;

use crate::bot::directory::ChatDirectory;
use crate::bot::traits::{ChatApi, ExpenseSink};
use crate::error::ExpenseBotError;
use crate::models::IncomingMessage;
use crate::parser::ExpenseParser;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::utils::Logger;

/// 处理单条消息：解析、写表格、回复发送者并通知其他用户
#[derive(Clone)]
pub struct MessageHandler {
    chat: Arc<dyn ChatApi>,
    sink: Arc<dyn ExpenseSink>,
    parser: ExpenseParser,
    chats: Arc<ChatDirectory>,
    retry: RetryConfig,
}

impl MessageHandler {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        sink: Arc<dyn ExpenseSink>,
        parser: ExpenseParser,
        retry: RetryConfig,
    ) -> Self {
        Self {
            chat,
            sink,
            parser,
            chats: Arc::new(ChatDirectory::new()),
            retry,
        }
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.chats
    }

    pub async fn handle_message(&self, message: &IncomingMessage) {
        debug!(
            "Handling message from user {} in chat {}: {}",
            message.sender_id, message.chat_id, message.text
        );
        self.chats.record(message.sender_id, message.chat_id);

        let expense = match self.parser.parse(message.sender_id, &message.text) {
            Ok(expense) => expense,
            Err(e) => {
                self.report_error("could not parse message", &e).await;
                return;
            }
        };

        let values = expense.values();
        let appended = retry_with_backoff(
            || self.sink.append(values.clone()),
            self.retry,
            "append to sheet",
        )
        .await;
        if let Err(e) = appended {
            self.report_error("could not append to sheet", &e).await;
            return;
        }
        Logger::log_expense(&expense, message.chat_id);

        let mut sends = vec![self.send_best_effort(message.chat_id, format!("roger: {expense}"))];

        let notification = format!("note: {expense}");
        for user_id in self.parser.users().ids() {
            if user_id == message.sender_id {
                continue;
            }

            match self.chats.get(user_id) {
                Some(chat_id) => sends.push(self.send_best_effort(chat_id, notification.clone())),
                None => debug!("Chat of user {user_id} is not known yet, skipping notification"),
            }
        }

        join_all(sends).await;
    }

    /// 错误只发给管理员，发送者收不到任何回复
    async fn report_error(&self, context: &str, error: &ExpenseBotError) {
        let content = format!("{context}: {error}");
        if error.is_per_message() {
            warn!("{content}");
        } else {
            error!("[{}] {content}", error.severity());
        }

        let admin = self.parser.users().admin();
        match self.chats.get(admin) {
            Some(chat_id) => self.send_best_effort(chat_id, content).await,
            None => warn!("could not load chat id of admin user: {admin}"),
        }
    }

    async fn send_best_effort(&self, chat_id: i64, text: String) {
        let sent = retry_with_backoff(
            || self.chat.send_message(chat_id, &text),
            self.retry,
            "send message",
        )
        .await;

        if let Err(e) = sent {
            error!("could not send message to chat {chat_id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::traits::MockExpenseSink;
    use crate::config::UserRegistry;
    use crate::error::Result;
    use crate::models::IncomingUpdate;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<(i64, String)>>,
    }

    impl RecordingChat {
        fn sent(&self) -> Vec<(i64, String)> {
            let mut sent = self.sent.lock().unwrap().clone();
            sent.sort();
            sent
        }
    }

    #[async_trait]
    impl ChatApi for RecordingChat {
        async fn get_updates(&self, _: i32, _: u8, _: Duration) -> Result<Vec<IncomingUpdate>> {
            Ok(Vec::new())
        }

        async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn handler(chat: Arc<RecordingChat>, sink: MockExpenseSink) -> MessageHandler {
        let users = UserRegistry::parse("Sirius=119838553,Luna=42,Mars=43", "Luna").unwrap();
        MessageHandler::new(
            chat,
            Arc::new(sink),
            ExpenseParser::new(users),
            RetryConfig::with_max_retries(0),
        )
    }

    fn message(sender_id: i64, chat_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            sender_id,
            chat_id,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_appends_row_and_fans_out() {
        let chat = Arc::new(RecordingChat::default());
        let mut sink = MockExpenseSink::new();
        sink.expect_append()
            .withf(|values: &Vec<Value>| {
                values.len() == 5
                    && values[0] == Value::from("taxi")
                    && values[1] == Value::from(23.8)
                    && values[2] == Value::from("Sirius")
                    && values[3] == Value::from("")
            })
            .times(1)
            .returning(|_| Ok(()));

        let handler = handler(chat.clone(), sink);
        handler.directory().record(42, 4200);

        handler.handle_message(&message(119838553, 555, "taxi 23.8")).await;

        assert_eq!(
            chat.sent(),
            vec![
                (555, "roger: Sirius spent 23.80 on taxi".to_string()),
                (4200, "note: Sirius spent 23.80 on taxi".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_parse_error_goes_to_admin_only() {
        let chat = Arc::new(RecordingChat::default());
        let mut sink = MockExpenseSink::new();
        sink.expect_append().times(0);

        let handler = handler(chat.clone(), sink);
        handler.directory().record(42, 4200);

        handler.handle_message(&message(119838553, 555, "taxi")).await;

        assert_eq!(
            chat.sent(),
            vec![(4200, "could not parse message: invalid message: taxi".to_string())]
        );
        assert_eq!(handler.directory().get(119838553), Some(555));
    }

    #[tokio::test]
    async fn test_append_error_without_known_admin_is_only_logged() {
        let chat = Arc::new(RecordingChat::default());
        let mut sink = MockExpenseSink::new();
        sink.expect_append().times(1).returning(|_| {
            Err(ExpenseBotError::Sheets {
                status: 500,
                body: "backend error".to_string(),
            })
        });

        let handler = handler(chat.clone(), sink);
        handler.handle_message(&message(119838553, 555, "taxi 23.8")).await;

        assert!(chat.sent().is_empty());
    }
}
