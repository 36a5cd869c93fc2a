// 公开内部模块以便测试
pub mod bot;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod retry;
pub mod sheets;
pub mod utils;

// 重新导出常用的类型和结构体
pub use bot::{BotDispatcher, ChatApi, ExpenseSink, MessageHandler, TelegramChat};
pub use config::{Settings, UserRegistry};
pub use error::ExpenseBotError;
pub use models::{Expense, IncomingMessage, IncomingUpdate};
pub use parser::ExpenseParser;
pub use sheets::SheetsClient;
