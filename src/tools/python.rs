//! Python 代码执行工具
//!
//! 步骤中含 `python` 时取其后的文本为代码；包一层前导（import math/json/sys，`_ctx` 绑定上一步输出），
//! 结尾打印局部变量 `result`。通过 `<interpreter> -c` 子进程运行，带超时，返回 stdout。

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::tools::{Tool, ToolCall, PYTHON_TOOL};

/// 代码执行工具：每次调用一个独立子进程
pub struct PythonTool {
    interpreter: String,
    timeout_secs: u64,
}

impl PythonTool {
    pub fn new(interpreter: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout_secs,
        }
    }
}

/// 取 `python` 所在词之后的文本；为空则退回整个步骤
pub fn extract_code(step: &str) -> String {
    // 在原串上逐字符比对，非 ASCII 字符不影响下标
    let found = step.char_indices().find_map(|(i, _)| {
        step.as_bytes()
            .get(i..i + 6)
            .filter(|w| w.eq_ignore_ascii_case(b"python"))
            .map(|_| i)
    });
    let Some(idx) = found else {
        return step.to_string();
    };
    let rest = &step[idx..];
    let token_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let code = rest[token_end..].trim();
    if code.is_empty() {
        step.to_string()
    } else {
        code.to_string()
    }
}

/// 拼出完整程序
pub fn wrap_program(code: &str, context: Option<&str>) -> String {
    let ctx = match context {
        Some(c) => serde_json::to_string(c).unwrap_or_else(|_| "None".to_string()),
        None => "None".to_string(),
    };
    format!(
        "import math, json, sys\n_ctx = {ctx}\n{code}\n\
         print(locals().get('result') if 'result' in locals() else '')\n"
    )
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        PYTHON_TOOL
    }

    fn description(&self) -> &str {
        "Run a short Python snippet and return stdout. \
         The local `result` is printed; `_ctx` holds the previous step's output."
    }

    async fn execute(&self, call: &ToolCall) -> Result<String, String> {
        let code = extract_code(&call.step);
        let program = wrap_program(&code, call.context.as_deref());
        let timeout_secs = call.param_u64("timeout").unwrap_or(self.timeout_secs);

        tracing::debug!(interpreter = %self.interpreter, code = %code, "python tool execute");

        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-c")
            .arg(&program)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
            .await
            .map_err(|_| "python timeout".to_string())?
            .map_err(|e| format!("python spawn failed: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() {
                "python error".to_string()
            } else {
                stderr
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code("python result = 2 + 3"), "result = 2 + 3");
        assert_eq!(extract_code("Run Python3: result = 1"), "result = 1");
        assert_eq!(extract_code("python"), "python");
        assert_eq!(extract_code("calc 3*7"), "calc 3*7");
    }

    #[test]
    fn test_extract_code_after_non_ascii_prefix() {
        // ẞ / İ 小写后字节长度改变
        assert_eq!(extract_code("Straẞe python result = 1"), "result = 1");
        assert_eq!(extract_code("İ PYTHON x = 1"), "x = 1");
        assert_eq!(extract_code("日本 python result = 'ok'"), "result = 'ok'");
    }

    #[test]
    fn test_wrap_program_context_literal() {
        let p = wrap_program("result = _ctx", Some("say \"hi\""));
        assert!(p.contains("_ctx = \"say \\\"hi\\\"\""));
        assert!(wrap_program("x = 1", None).contains("_ctx = None"));
    }

    #[tokio::test]
    async fn test_runs_snippet() {
        if !python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
        let tool = PythonTool::new("python3", 5);
        let out = tool
            .execute(&ToolCall::new("python result = 2 + 3"))
            .await
            .unwrap();
        assert_eq!(out, "5");
    }

    #[tokio::test]
    async fn test_context_is_visible() {
        if !python_available() {
            return;
        }
        let tool = PythonTool::new("python3", 5);
        let call = ToolCall::new("python result = _ctx.upper()").with_context(Some("abc".into()));
        assert_eq!(tool.execute(&call).await.unwrap(), "ABC");
    }

    #[tokio::test]
    async fn test_syntax_error_is_tool_error() {
        if !python_available() {
            return;
        }
        let tool = PythonTool::new("python3", 5);
        let err = tool.execute(&ToolCall::new("calc 3*7")).await.unwrap_err();
        assert!(err.contains("SyntaxError"), "{err}");
    }

    #[tokio::test]
    async fn test_timeout() {
        if !python_available() {
            return;
        }
        let tool = PythonTool::new("python3", 1);
        let err = tool
            .execute(&ToolCall::new("python import time; time.sleep(5)"))
            .await
            .unwrap_err();
        assert_eq!(err, "python timeout");
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let tool = PythonTool::new("definitely-not-a-python-binary", 1);
        let err = tool.execute(&ToolCall::new("python result = 1")).await.unwrap_err();
        assert!(err.starts_with("python spawn failed"));
    }
}
