//! 在线学习与故障隔离：UCB1 评分、按工具熔断

pub mod bandit;
pub mod breaker;

pub use bandit::{Arm, Ucb1, UNTRIED_SCORE};
pub use breaker::{BreakerBoard, BreakerSettings, CircuitBreaker};
