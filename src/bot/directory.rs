use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// 用户 id -> 最早见到该用户的聊天 id，多个处理任务并发读写
#[derive(Debug, Default)]
pub struct ChatDirectory {
    chats: RwLock<HashMap<i64, i64>>,
}

impl ChatDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只在不存在时插入，返回最终保存的聊天 id
    pub fn record(&self, user_id: i64, chat_id: i64) -> i64 {
        if let Some(existing) = self.get(user_id) {
            return existing;
        }

        let mut chats = self.chats.write().unwrap_or_else(PoisonError::into_inner);
        *chats.entry(user_id).or_insert(chat_id)
    }

    pub fn get(&self, user_id: i64) -> Option<i64> {
        self.chats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.chats.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
