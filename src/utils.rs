use log::{error, info};

use crate::models::Expense;

/// 日志记录工具
pub struct Logger;

impl Logger {
    pub fn log_operation_start(operation: &str, details: &str) {
        info!("🚀 Starting {}: {}", operation, details);
    }

    pub fn log_operation_success(operation: &str, details: &str) {
        info!("✅ {} completed successfully: {}", operation, details);
    }

    pub fn log_operation_failure(operation: &str, error: &str) {
        error!("❌ {} failed: {}", operation, error);
    }

    pub fn log_expense(expense: &Expense, chat_id: i64) {
        info!(
            "💰 Expense: {} | {:.2} | {} | chat {} | {}",
            expense.label,
            expense.amount,
            expense.spender,
            chat_id,
            expense.formatted_timestamp()
        );
    }
}
