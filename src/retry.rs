use crate::error::Result;
use log::{debug, warn};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// 首次尝试之外的重试次数
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: u32,
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// 第 `retry` 次重试前的等待时间（从 0 开始）：100ms, 1s, 10s, 100s, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.backoff_multiplier.saturating_pow(retry))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_millis(100),
            backoff_multiplier: 10,
        }
    }
}

/// 执行 `operation`，失败后按指数退避重试。所有错误都视为可重试。
pub async fn retry_with_backoff<F, Fut, T>(
    mut operation: F,
    config: RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut result = operation().await;

    for retry in 0..config.max_retries {
        let error = match result {
            Ok(value) => {
                if retry > 0 {
                    debug!("Operation '{operation_name}' succeeded after {retry} retries");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let delay = config.delay_for(retry);
        debug!("Waiting {delay:?} before retrying '{operation_name}'");
        sleep(delay).await;

        warn!("retry {retry} of '{operation_name}': {error}");
        result = operation().await;
    }

    if let Err(error) = &result {
        warn!(
            "Operation '{}' failed after {} attempts: {}",
            operation_name,
            config.max_retries + 1,
            error
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExpenseBotError;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn transient() -> ExpenseBotError {
        ExpenseBotError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "Temporary error",
        ))
    }

    #[test]
    fn test_default_delays() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_secs(1));
        assert_eq!(config.delay_for(2), Duration::from_secs(10));
        assert_eq!(config.delay_for(3), Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_on_second_attempt() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let operation = || {
            let counter = counter_clone.clone();
            async move {
                let mut count = counter.lock().unwrap();
                *count += 1;

                if *count == 1 {
                    Err(transient())
                } else {
                    Ok("success")
                }
            }
        };

        let result = retry_with_backoff(operation, RetryConfig::default(), "test_operation").await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(*counter.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_makes_five_attempts() {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let attempts_clone = attempts.clone();
        let start = Instant::now();

        let operation = || {
            let attempts = attempts_clone.clone();
            async move {
                let attempt = {
                    let mut attempts = attempts.lock().unwrap();
                    attempts.push(start.elapsed());
                    attempts.len()
                };
                Err::<(), _>(ExpenseBotError::malformed_input(format!("attempt {attempt}")))
            }
        };

        let result = retry_with_backoff(operation, RetryConfig::with_max_retries(4), "always_fails").await;

        // 返回最后一次的错误
        match result {
            Err(ExpenseBotError::MalformedInput { message }) => assert_eq!(message, "attempt 5"),
            other => panic!("unexpected result: {other:?}"),
        }

        let attempts = attempts.lock().unwrap();
        assert_eq!(attempts.len(), 5);
        let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(1_000),
                Duration::from_millis(10_000),
                Duration::from_millis(100_000),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let counter = Arc::new(Mutex::new(0));
        let counter_clone = counter.clone();

        let result: Result<()> = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    Err(transient())
                }
            },
            RetryConfig::with_max_retries(0),
            "no_retry",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(*counter.lock().unwrap(), 1);
    }
}
