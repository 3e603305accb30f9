//! OmniScope - 自适应步骤分派引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误、重试策略、执行记录、分派引擎（solve / health）
//! - **learning**: UCB1 评分与按工具熔断
//! - **memory**: 只追加的执行轨迹
//! - **observability**: tracing 初始化
//! - **routing**: 任务切分、规则热加载、关键词兜底路由
//! - **tools**: 工具箱（python、http、json）与执行器

pub mod config;
pub mod core;
pub mod learning;
pub mod memory;
pub mod observability;
pub mod routing;
pub mod tools;

pub use crate::core::{
    Engine, EngineBuilder, EngineError, ExecutionRecord, Outcome, StepStatus, ToolHealth,
};
