use chrono::{DateTime, Duration, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// 过期前多久就视为已过期
const EXPIRY_SKEW_SECONDS: i64 = 10;

/// 缓存在本地的 OAuth token，格式与常见的 token.json 一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// token 端点的响应
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl OAuthToken {
    /// 刷新响应中可能没有 refresh_token，此时沿用之前的
    pub fn from_response(response: TokenResponse, previous_refresh_token: &str) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            refresh_token: response
                .refresh_token
                .filter(|token| !token.is_empty())
                .unwrap_or_else(|| previous_refresh_token.to_string()),
            expiry: response
                .expires_in
                .map(|seconds| Utc::now() + Duration::seconds(seconds)),
        }
    }

    /// 零值时间（0001-01-01）表示没有过期时间
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if expiry.timestamp() > 0 => {
                expiry - Duration::seconds(EXPIRY_SKEW_SECONDS) <= now
            }
            _ => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving credential file to: {}", path.display());

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut writer = BufWriter::new(options.open(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn token(expiry: Option<DateTime<Utc>>) -> OAuthToken {
        OAuthToken {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: "refresh".to_string(),
            expiry,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token.json");
        let original = token(Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()));

        original.save(&path).unwrap();
        assert_eq!(OAuthToken::load(&path).unwrap(), original);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_load_token_with_offset_and_zero_expiry() {
        let json = r#"{"access_token":"a","token_type":"Bearer","refresh_token":"r","expiry":"2030-01-01T08:00:00+08:00"}"#;
        let parsed: OAuthToken = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.expiry,
            Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );

        let zero = r#"{"access_token":"a","expiry":"0001-01-01T00:00:00Z"}"#;
        let parsed: OAuthToken = serde_json::from_str(zero).unwrap();
        assert!(!parsed.is_expired());
        assert_eq!(parsed.refresh_token, "");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(OAuthToken::load(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_expiry_with_skew() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert!(!token(None).is_expired_at(now));
        assert!(token(Some(now)).is_expired_at(now));
        assert!(token(Some(now + Duration::seconds(5))).is_expired_at(now));
        assert!(!token(Some(now + Duration::seconds(60))).is_expired_at(now));
    }

    #[test]
    fn test_from_response_keeps_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","token_type":"Bearer","expires_in":3599}"#)
                .unwrap();
        let refreshed = OAuthToken::from_response(response, "refresh");

        assert_eq!(refreshed.access_token, "new");
        assert_eq!(refreshed.refresh_token, "refresh");
        assert!(refreshed.expiry.is_some());
        assert!(!refreshed.is_expired());
    }
}
