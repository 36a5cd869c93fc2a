use crate::config::UserRegistry;
use crate::error::{ExpenseBotError, Result};
use crate::models::Expense;
use crate::parser::regex::RegexPatterns;
use log::debug;

/// 金额之前至少需要的非数字字符数
const MIN_PREFIX_CHARS: usize = 2;

#[derive(Clone, Debug)]
pub struct ExpenseParser {
    patterns: &'static RegexPatterns,
    users: UserRegistry,
}

impl ExpenseParser {
    pub fn new(users: UserRegistry) -> Self {
        Self {
            patterns: RegexPatterns::get_instance(),
            users,
        }
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    /// 解析某个用户发来的消息，未知用户或格式错误时返回对应错误
    pub fn parse(&self, sender_id: i64, text: &str) -> Result<Expense> {
        let spender = self
            .users
            .name_of(sender_id)
            .ok_or_else(|| ExpenseBotError::unknown_user(sender_id))?;

        let (label, amount) = self.parse_entry(text)?;
        debug!("Parsed expense from {spender}: {label} {amount}");

        Ok(Expense::new(label, amount, spender))
    }

    /// 只解析文本部分，返回 (名称, 金额)
    pub fn parse_entry(&self, text: &str) -> Result<(String, f64)> {
        let captures = self
            .patterns
            .expense_regex
            .captures(text)
            .ok_or_else(|| ExpenseBotError::malformed_input(text))?;

        let (Some(label), Some(amount)) = (captures.get(1), captures.get(2)) else {
            return Err(ExpenseBotError::malformed_input(text));
        };

        // 金额前面（包括空白）至少要有两个非数字字符
        let prefix = &text[..amount.start()];
        if prefix.chars().filter(|c| !c.is_ascii_digit()).count() < MIN_PREFIX_CHARS {
            return Err(ExpenseBotError::malformed_input(text));
        }
        let label = label.as_str().trim();

        let raw_amount = amount.as_str();
        let amount = raw_amount
            .parse::<f64>()
            .ok()
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| {
                ExpenseBotError::malformed_input(format!("could not convert {raw_amount} to float"))
            })?;

        Ok((label.to_string(), amount))
    }
}
