//! 重试策略：最多 retries + 1 次尝试，第 n 次失败后退避 backoff_step * n

use std::time::Duration;

/// 有界重试策略（线性递增退避）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff_step: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, backoff_step: Duration) -> Self {
        Self {
            retries,
            backoff_step,
        }
    }

    /// 单个步骤的总尝试次数
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// 第 attempt 次（从 1 开始）失败后的等待时长；最后一次失败之后不再等待，返回 None
    pub fn backoff_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts() {
            return None;
        }
        Some(self.backoff_step * attempt)
    }
}
