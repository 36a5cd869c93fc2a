use crate::error::{ExpenseBotError, Result};
use std::collections::HashMap;

/// 启动时固定的用户表：Telegram 用户 id -> 显示名称，外加一个管理员
#[derive(Debug, Clone)]
pub struct UserRegistry {
    users: HashMap<i64, String>,
    admin: i64,
}

impl UserRegistry {
    /// 由 `name=id[,name=id]` 格式的用户列表和管理员名称构造
    pub fn parse(users: &str, admin: &str) -> Result<Self> {
        let users = parse_users(users)?;
        Self::new(users, admin)
    }

    pub fn new(users: HashMap<i64, String>, admin: &str) -> Result<Self> {
        let admin = users
            .iter()
            .find(|(_, name)| name.as_str() == admin)
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                ExpenseBotError::config(format!("could not find admin {admin:?} in users"))
            })?;

        Ok(Self { users, admin })
    }

    pub fn name_of(&self, user_id: i64) -> Option<&str> {
        self.users.get(&user_id).map(String::as_str)
    }

    pub fn admin(&self) -> i64 {
        self.admin
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.users.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

pub fn parse_users(users: &str) -> Result<HashMap<i64, String>> {
    let mut map = HashMap::new();

    for pair in users.split(',') {
        let (name, id) = pair
            .split_once('=')
            .filter(|(name, id)| !name.trim().is_empty() && !id.contains('='))
            .ok_or_else(|| ExpenseBotError::config(format!("invalid user: {pair}")))?;

        let id = id
            .trim()
            .parse::<i64>()
            .map_err(|_| ExpenseBotError::config(format!("invalid user: {pair}")))?;

        map.insert(id, name.trim().to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users() {
        let users = parse_users("Sirius=119838553,Luna=42").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[&119838553], "Sirius");
        assert_eq!(users[&42], "Luna");
    }

    #[test]
    fn test_parse_users_rejects_malformed_pairs() {
        for input in ["", "Sirius", "Sirius=abc", "Sirius=1=2", "=42", "Sirius=1,,Luna=2"] {
            let err = parse_users(input).unwrap_err();
            assert!(
                matches!(err, ExpenseBotError::Config { .. }),
                "{input:?} should be a config error"
            );
        }
    }

    #[test]
    fn test_registry_resolves_admin() {
        let registry = UserRegistry::parse("Sirius=119838553,Luna=42", "Luna").unwrap();
        assert_eq!(registry.admin(), 42);
        assert_eq!(registry.name_of(119838553), Some("Sirius"));
        assert_eq!(registry.name_of(7), None);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_requires_admin_in_users() {
        let err = UserRegistry::parse("Sirius=119838553", "Luna").unwrap_err();
        assert!(matches!(err, ExpenseBotError::Config { .. }));
        assert!(err.to_string().contains("could not find admin"));
    }
}
