//! 引擎错误类型
//!
//! 与执行循环配合：UnknownTool 不可重试（重试无意义），其余工具错误按 RetryPolicy 重试。
//! 熔断跳过不是错误，见 `StepStatus::Skipped`。

use thiserror::Error;

/// 分派引擎运行过程中可能出现的错误（未知工具、工具失败 / 超时 / panic、规则加载、轨迹写入）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    ToolExecutionFailed(String),

    #[error("tool timeout: {tool} exceeded {timeout_ms}ms")]
    ToolTimeout { tool: String, timeout_ms: u64 },

    /// 工具内部 panic，已被执行器捕获
    #[error("tool panicked: {0}")]
    ToolPanicked(String),

    /// 规则文档读取或解析失败（引擎继续使用上一份有效文档）
    #[error("rule load error: {0}")]
    RuleLoad(String),

    #[error("trace sink error: {0}")]
    Trace(String),
}

impl EngineError {
    /// 是否值得重试：路由到未注册的工具时重试无济于事
    pub fn is_retryable(&self) -> bool {
        !matches!(self, EngineError::UnknownTool(_))
    }
}
