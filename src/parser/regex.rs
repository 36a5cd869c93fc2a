use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug)]
pub struct RegexPatterns {
    pub expense_regex: Regex,
}

impl RegexPatterns {
    pub fn new() -> Self {
        Self {
            // 匹配 "名称 金额"：金额必须是结尾的最后一个数字，名称中可以包含数字
            expense_regex: Regex::new(r"(?s)^(.+?)\s*([0-9]+(?:\.[0-9]*)?)\s*$").unwrap(),
        }
    }

    pub fn get_instance() -> &'static Self {
        static INSTANCE: OnceLock<RegexPatterns> = OnceLock::new();
        INSTANCE.get_or_init(RegexPatterns::new)
    }
}

impl Default for RegexPatterns {
    fn default() -> Self {
        Self::new()
    }
}
