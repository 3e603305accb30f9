//! 工具箱：代码执行（python）、网络抓取（http）、数据转换（json）与执行器

pub mod executor;
pub mod http;
pub mod json;
pub mod python;
pub mod registry;

pub use executor::ToolExecutor;
pub use http::HttpTool;
pub use json::JsonTool;
pub use python::PythonTool;
pub use registry::{Tool, ToolCall, ToolRegistry};

use crate::config::ToolsSection;

pub const PYTHON_TOOL: &str = "python";
pub const HTTP_TOOL: &str = "http";
pub const JSON_TOOL: &str = "json";

/// 按配置注册内置的三个工具
pub fn builtin_registry(cfg: &ToolsSection) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(PythonTool::new(
        cfg.python.interpreter.clone(),
        cfg.python.timeout_secs,
    ));
    tools.register(HttpTool::new(cfg.http.timeout_secs, cfg.http.max_body_bytes));
    tools.register(JsonTool);
    tools
}
