//! 工具执行器
//!
//! 持有 ToolRegistry 与单次尝试超时，execute(tool_name, call) 在超时内调用 registry.execute，
//! 超时转为 ToolTimeout，工具 panic 转为 ToolPanicked；每次调用输出结构化审计日志（JSON）。

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::time::timeout;

use crate::core::EngineError;
use crate::tools::{ToolCall, ToolRegistry};

/// 工具执行器：对每次调用施加超时，并将结果映射为 EngineError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// 执行一次尝试；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, call: &ToolCall) -> Result<String, EngineError> {
        let start = Instant::now();
        let fut = AssertUnwindSafe(self.registry.execute(tool_name, call)).catch_unwind();
        let result = match timeout(self.timeout, fut).await {
            Ok(Ok(inner)) => inner,
            Ok(Err(panic)) => Err(EngineError::ToolPanicked(panic_message(panic.as_ref()))),
            Err(_) => Err(EngineError::ToolTimeout {
                tool: tool_name.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(EngineError::ToolTimeout { .. }) => "timeout",
            Err(EngineError::UnknownTool(_)) => "unknown",
            Err(EngineError::ToolPanicked(_)) => "panic",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "args_preview": args_preview(call),
        });
        tracing::info!(audit = %audit, "tool");

        result
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.registry.tool_descriptions()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn args_preview(call: &ToolCall) -> String {
    let s = call.step.as_str();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;

    struct Sleepy;

    #[async_trait]
    impl Tool for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn description(&self) -> &str {
            "Sleeps longer than any sane timeout"
        }

        async fn execute(&self, _call: &ToolCall) -> Result<String, String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("late".to_string())
        }
    }

    struct Panicky;

    #[async_trait]
    impl Tool for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn description(&self) -> &str {
            "Always panics"
        }

        async fn execute(&self, _call: &ToolCall) -> Result<String, String> {
            panic!("kaboom")
        }
    }

    fn executor() -> ToolExecutor {
        let mut reg = ToolRegistry::new();
        reg.register(Sleepy);
        reg.register(Panicky);
        ToolExecutor::new(reg, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_timeout_is_tool_error() {
        let err = executor()
            .execute("sleepy", &ToolCall::new("zzz"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ToolTimeout { ref tool, .. } if tool == "sleepy"));
        assert!(err.is_retryable());
        // 亚秒级超时按毫秒报告
        assert_eq!(err.to_string(), "tool timeout: sleepy exceeded 50ms");
    }

    #[tokio::test]
    async fn test_panic_is_captured() {
        let err = executor()
            .execute("panicky", &ToolCall::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::ToolPanicked("kaboom".into()));
    }

    #[tokio::test]
    async fn test_unknown_tool_passes_through() {
        let err = executor()
            .execute("calc", &ToolCall::new("3*7"))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownTool("calc".into()));
    }

    #[test]
    fn test_args_preview_truncates() {
        let long = "x".repeat(300);
        let preview = args_preview(&ToolCall::new(long));
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
    }
}
