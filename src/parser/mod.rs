pub mod expense;
pub mod regex;

pub use expense::ExpenseParser;
pub use regex::RegexPatterns;
