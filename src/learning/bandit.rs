//! UCB1 多臂老虎机：每个工具一条臂
//!
//! score = r/n + sqrt(2 ln(total) / n)；从未试过的臂记 1 次试验并返回极大哨兵值，
//! 保证每个工具在利用阶段之前至少被探索一次。
//! 臂之间互不阻塞：外层 RwLock 只保护臂表，计数更新在各自臂的 Mutex 内完成。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// 未试过臂的评分（远大于任何 r/n + bonus）
pub const UNTRIED_SCORE: f64 = 1000.0;

/// 单臂统计：试验次数与累计奖励
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Arm {
    pub trials: u64,
    pub reward: f64,
}

/// 每个引擎实例独享一份，不做进程级单例
#[derive(Debug, Default)]
pub struct Ucb1 {
    arms: RwLock<HashMap<String, Arc<Mutex<Arm>>>>,
    total: AtomicU64,
}

impl Ucb1 {
    pub fn new() -> Self {
        Self::default()
    }

    fn arm(&self, tool: &str) -> Arc<Mutex<Arm>> {
        if let Some(arm) = self
            .arms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tool)
        {
            return Arc::clone(arm);
        }
        let mut arms = self.arms.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(arms.entry(tool.to_string()).or_default())
    }

    /// 计算当前评分（同时累加全局试验计数）
    pub fn choose(&self, tool: &str) -> f64 {
        let total = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        let arm = self.arm(tool);
        let mut arm = arm.lock().unwrap_or_else(|e| e.into_inner());
        if arm.trials == 0 {
            arm.trials = 1;
            return UNTRIED_SCORE;
        }
        let n = arm.trials as f64;
        let bonus = (2.0 * (total as f64).ln() / n).sqrt();
        arm.reward / n + bonus
    }

    /// 每个步骤结束后调用一次：试验 +1，成功时奖励 +1.0
    pub fn update(&self, tool: &str, success: bool) {
        let arm = self.arm(tool);
        let mut arm = arm.lock().unwrap_or_else(|e| e.into_inner());
        arm.trials += 1;
        if success {
            arm.reward += 1.0;
        }
    }

    pub fn stats(&self, tool: &str) -> Arm {
        self.arms
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(tool)
            .map(|arm| *arm.lock().unwrap_or_else(|e| e.into_inner()))
            .unwrap_or_default()
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untried_arm_dominates() {
        let bandit = Ucb1::new();
        for _ in 0..50 {
            bandit.choose("python");
            bandit.update("python", true);
        }
        let seasoned = bandit.choose("python");
        let fresh = bandit.choose("http");
        assert!(fresh > seasoned);
        assert_eq!(fresh, UNTRIED_SCORE);
        // 第一次 choose 已记 1 次试验
        assert_eq!(bandit.stats("http").trials, 1);
    }

    #[test]
    fn test_score_formula() {
        let bandit = Ucb1::new();
        bandit.choose("json"); // total=1, trials=1
        bandit.update("json", true); // trials=2, reward=1
        let score = bandit.choose("json"); // total=2
        let expected = 1.0 / 2.0 + (2.0 * 2f64.ln() / 2.0).sqrt();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_update_increments_by_one() {
        let bandit = Ucb1::new();
        for i in 1..=5u64 {
            bandit.update("http", i % 2 == 0);
            let arm = bandit.stats("http");
            assert_eq!(arm.trials, i);
        }
        assert_eq!(bandit.stats("http").reward, 2.0);
        assert_eq!(bandit.total(), 0);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let bandit = Arc::new(Ucb1::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let b = Arc::clone(&bandit);
                std::thread::spawn(move || {
                    let tool = if i % 2 == 0 { "python" } else { "http" };
                    for _ in 0..100 {
                        b.update(tool, true);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(bandit.stats("python").trials, 400);
        assert_eq!(bandit.stats("http").trials, 400);
    }
}
