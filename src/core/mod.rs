//! 核心编排层：错误、重试策略、执行记录、分派引擎

pub mod engine;
pub mod error;
pub mod outcome;
pub mod retry;

pub use engine::{Engine, EngineBuilder, CIRCUIT_OPEN};
pub use error::EngineError;
pub use outcome::{ExecutionRecord, Outcome, StepStatus, ToolHealth};
pub use retry::RetryPolicy;
