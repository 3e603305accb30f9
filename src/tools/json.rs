//! JSON 转换工具：上一步输出像 JSON 对象时解析它，否则解析步骤文本；返回两空格缩进的格式化结果

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolCall, JSON_TOOL};

pub struct JsonTool;

#[async_trait]
impl Tool for JsonTool {
    fn name(&self) -> &str {
        JSON_TOOL
    }

    fn description(&self) -> &str {
        "Parse the previous output (if it looks like a JSON object) or the step text, \
         and pretty-print it."
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, String> {
        let payload = match call.context.as_deref() {
            Some(ctx) if ctx.trim_start().starts_with('{') => ctx,
            _ => call.step.as_str(),
        };
        let data: Value =
            serde_json::from_str(payload).map_err(|e| format!("json error: {}", e))?;
        serde_json::to_string_pretty(&data).map_err(|e| format!("json error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefers_object_context() {
        let call = ToolCall::new("json").with_context(Some("{\"a\": 1}".into()));
        let out = JsonTool.execute(&call).await.unwrap();
        assert_eq!(out, "{\n  \"a\": 1\n}");
    }

    #[tokio::test]
    async fn test_falls_back_to_step() {
        let call = ToolCall::new("[1, 2]").with_context(Some("not json".into()));
        let out = JsonTool.execute(&call).await.unwrap();
        assert_eq!(out, "[\n  1,\n  2\n]");
    }

    #[tokio::test]
    async fn test_parse_failure() {
        let err = JsonTool.execute(&ToolCall::new("json")).await.unwrap_err();
        assert!(err.starts_with("json error:"));
    }
}
