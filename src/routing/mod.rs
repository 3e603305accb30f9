//! 路由层：任务切分、规则热加载、关键词兜底
//!
//! Router::route 先查规则（命中即短路），否则走 heuristic。

pub mod heuristic;
pub mod planner;
pub mod rules;

pub use planner::plan;
pub use rules::{Rule, RuleDocument, RuleEngine, RuleFormat};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 路由结果：工具名 + 参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Route {
    pub fn new(tool: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            tool: tool.into(),
            params,
        }
    }
}

/// 组合路由器：规则优先，关键词兜底
pub struct Router {
    rules: RuleEngine,
}

impl Router {
    pub fn new(rules: RuleEngine) -> Self {
        Self { rules }
    }

    /// 先刷新规则（仅 stat），再匹配；永不失败
    pub fn route(&self, step: &str) -> Route {
        self.rules.refresh();
        self.rules
            .match_step(step)
            .unwrap_or_else(|| heuristic::route(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{JSON_TOOL, PYTHON_TOOL};

    #[test]
    fn test_rule_beats_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, "rules:\n  - if_contains: [invoice]\n    tool: json\n").unwrap();
        let router = Router::new(RuleEngine::new(&path));

        // 无规则时 heuristic 会选 python
        assert_eq!(heuristic::route("process invoice now").tool, PYTHON_TOOL);
        assert_eq!(router.route("process invoice now").tool, JSON_TOOL);
        assert_eq!(router.route("compute 1+1").tool, PYTHON_TOOL);
    }
}
