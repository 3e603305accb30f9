//! 熔断器：按工具统计连续失败
//!
//! - closed → open：连续失败数达到 window（默认 5）
//! - open → closed：冷却期（默认 5s）过后的下一次评估（record 或 is_open）时关闭并清零失败计数
//! - closed 状态下成功一次即清零

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// 熔断参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    pub window: u32,
    pub cool_down: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            window: 5,
            cool_down: Duration::from_secs(5),
        }
    }
}

/// 单个工具的熔断状态
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    settings: BreakerSettings,
    failures: u32,
    open: bool,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            failures: 0,
            open: false,
            opened_at: None,
        }
    }

    fn cooled_down(&self) -> bool {
        self.opened_at
            .map_or(true, |at| at.elapsed() > self.settings.cool_down)
    }

    /// 冷却期已过则关闭并清零
    fn settle(&mut self) {
        if self.open && self.cooled_down() {
            self.open = false;
            self.failures = 0;
            self.opened_at = None;
        }
    }

    /// 记录一个步骤的最终结果
    pub fn record(&mut self, success: bool) {
        self.settle();
        if success {
            self.failures = 0;
            return;
        }
        self.failures += 1;
        // 已打开时再失败也重新计时，冷却期从最近一次失败算起
        if self.failures >= self.settings.window {
            self.open = true;
            self.opened_at = Some(Instant::now());
        }
    }

    /// 尝试前的闸门检查；冷却期已过时顺带关闭
    pub fn is_open(&mut self) -> bool {
        self.settle();
        self.open
    }

    /// 只读查看：冷却期已过视为关闭，但不改变状态
    pub fn peek_open(&self) -> bool {
        self.open && !self.cooled_down()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }
}

/// 按工具名持有熔断器；不同工具互不阻塞
#[derive(Debug, Default)]
pub struct BreakerBoard {
    settings: BreakerSettings,
    breakers: RwLock<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
}

impl BreakerBoard {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    fn breaker(&self, tool: &str) -> Arc<Mutex<CircuitBreaker>> {
        if let Some(b) = self
            .breakers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tool)
        {
            return Arc::clone(b);
        }
        let mut breakers = self.breakers.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            breakers
                .entry(tool.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(self.settings)))),
        )
    }

    pub fn is_open(&self, tool: &str) -> bool {
        let breaker = self.breaker(tool);
        let open = breaker.lock().unwrap_or_else(|e| e.into_inner()).is_open();
        open
    }

    pub fn record(&self, tool: &str, success: bool) {
        let breaker = self.breaker(tool);
        let mut b = breaker.lock().unwrap_or_else(|e| e.into_inner());
        let was_open = b.peek_open();
        b.record(success);
        if !was_open && b.peek_open() {
            tracing::warn!(
                tool = %tool,
                failures = b.consecutive_failures(),
                cool_down_ms = self.settings.cool_down.as_millis() as u64,
                "circuit opened"
            );
        }
    }

    /// 诊断用快照：(是否打开, 连续失败数)；从未使用过的工具视为关闭
    pub fn snapshot(&self, tool: &str) -> (bool, u32) {
        self.breakers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tool)
            .map(|b| {
                let b = b.lock().unwrap_or_else(|e| e.into_inner());
                (b.peek_open(), b.consecutive_failures())
            })
            .unwrap_or((false, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(ms: u64) -> BreakerSettings {
        BreakerSettings {
            window: 5,
            cool_down: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_opens_after_window_failures() {
        let mut cb = CircuitBreaker::new(BreakerSettings::default());
        for _ in 0..4 {
            cb.record(false);
            assert!(!cb.is_open());
        }
        cb.record(false);
        assert!(cb.is_open());
    }

    #[test]
    fn test_success_resets_failures_while_closed() {
        let mut cb = CircuitBreaker::new(BreakerSettings::default());
        for _ in 0..4 {
            cb.record(false);
        }
        cb.record(true);
        assert_eq!(cb.consecutive_failures(), 0);
        for _ in 0..4 {
            cb.record(false);
        }
        assert!(!cb.is_open());
    }

    #[test]
    fn test_success_within_cool_down_does_not_close() {
        let mut cb = CircuitBreaker::new(BreakerSettings::default());
        for _ in 0..5 {
            cb.record(false);
        }
        cb.record(true);
        assert!(cb.is_open());
        assert!(cb.peek_open());
    }

    #[test]
    fn test_record_after_cool_down_closes_first() {
        let mut cb = CircuitBreaker::new(short(30));
        for _ in 0..5 {
            cb.record(false);
        }
        assert!(cb.peek_open());
        std::thread::sleep(Duration::from_millis(60));

        // 失败也会先关闭、清零，再计 1 次失败
        cb.record(false);
        assert!(!cb.peek_open());
        assert_eq!(cb.consecutive_failures(), 1);
    }

    #[test]
    fn test_failure_while_open_extends_cool_down() {
        let mut cb = CircuitBreaker::new(short(200));
        for _ in 0..5 {
            cb.record(false);
        }
        std::thread::sleep(Duration::from_millis(120));
        cb.record(false);
        assert_eq!(cb.consecutive_failures(), 6);

        // 距首次打开已超过冷却期，距最近一次失败未超过
        std::thread::sleep(Duration::from_millis(120));
        assert!(cb.peek_open());
        std::thread::sleep(Duration::from_millis(150));
        assert!(!cb.is_open());
    }

    #[test]
    fn test_is_open_after_cool_down_closes() {
        let mut cb = CircuitBreaker::new(short(30));
        for _ in 0..5 {
            cb.record(false);
        }
        std::thread::sleep(Duration::from_millis(60));
        assert!(!cb.is_open());
        assert_eq!(cb.consecutive_failures(), 0);
    }

    #[test]
    fn test_board_isolates_tools() {
        let board = BreakerBoard::new(BreakerSettings::default());
        for _ in 0..5 {
            board.record("http", false);
        }
        assert!(board.is_open("http"));
        assert!(!board.is_open("python"));
        assert_eq!(board.snapshot("http"), (true, 5));
        assert_eq!(board.snapshot("json"), (false, 0));
    }
}
