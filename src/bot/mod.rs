pub mod directory;
pub mod dispatcher;
pub mod handler;
pub mod telegram;
pub mod traits;

pub use directory::ChatDirectory;
pub use dispatcher::BotDispatcher;
pub use handler::MessageHandler;
pub use telegram::TelegramChat;
pub use traits::{ChatApi, ExpenseSink};
