//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时并统一转 EngineError。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::EngineError;

/// 一次工具调用的输入：步骤文本、路由参数、上一步成功输出
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub step: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub context: Option<String>,
}

impl ToolCall {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            ..Self::default()
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(|v| v.as_u64())
    }
}

/// 工具 trait：名称、描述、异步执行；失败返回人类可读的错误信息
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（路由结果中的 tool 字段）
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 执行工具
    async fn execute(&self, call: &ToolCall) -> Result<String, String>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，支持 register / execute / tool_names
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名工具后注册者覆盖先注册者
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// 未注册 → UnknownTool；工具返回 Err → ToolExecutionFailed（信息原样保留）
    pub async fn execute(&self, name: &str, call: &ToolCall) -> Result<String, EngineError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| EngineError::UnknownTool(name.to_string()))?;
        tool.execute(call)
            .await
            .map_err(EngineError::ToolExecutionFailed)
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// 返回 (name, description) 列表，按名称排序
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect();
        out.sort();
        out
    }
}
