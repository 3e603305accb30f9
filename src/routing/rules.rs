//! 规则引擎（热加载）
//!
//! 规则文档格式（YAML，`.toml` 后缀时按 TOML 解析）：
//!
//! ```yaml
//! rules:
//!   - if_contains: ["invoice", "receipt"]
//!     tool: json
//!     params: { indent: 2 }
//! ```
//!
//! 每次路由前调用 `refresh()`：只做一次 stat，mtime 前进才重新解析，解析成功后整体替换 `Arc<RuleDocument>`。
//! 读取 / 解析失败时保留上一份有效文档（首次加载失败则为空规则集），从不向调用方报错。

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Route;
use crate::core::EngineError;

/// 单条规则：触发词（大小写不敏感的子串匹配）、首选工具、可选参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(alias = "triggers", default)]
    pub if_contains: Vec<String>,
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Rule {
    fn hits(&self, lowered: &str) -> bool {
        self.if_contains
            .iter()
            .any(|term| lowered.contains(&term.to_lowercase()))
    }
}

/// 不可变规则快照；热加载时整体替换，从不原地修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// 规则源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Yaml,
    Toml,
}

impl RuleFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => RuleFormat::Toml,
            _ => RuleFormat::Yaml,
        }
    }
}

impl RuleDocument {
    /// 解析规则文档；空白内容视为空规则集
    pub fn parse(content: &str, format: RuleFormat) -> Result<Self, EngineError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        match format {
            RuleFormat::Yaml => serde_yaml::from_str::<Option<RuleDocument>>(content)
                .map(Option::unwrap_or_default)
                .map_err(|e| EngineError::RuleLoad(e.to_string())),
            RuleFormat::Toml => {
                toml::from_str(content).map_err(|e| EngineError::RuleLoad(e.to_string()))
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::RuleLoad(format!("{}: {}", path.display(), e)))?;
        Self::parse(&content, RuleFormat::from_path(path))
    }

    /// 文档顺序中第一条命中的规则
    pub fn matching(&self, text: &str) -> Option<&Rule> {
        let lowered = text.to_lowercase();
        self.rules.iter().find(|rule| rule.hits(&lowered))
    }
}

/// 热加载规则引擎：一次 stat 判断是否变更，Arc 指针整体替换保证读者只见完整文档
pub struct RuleEngine {
    path: PathBuf,
    /// 最近一次认领的 mtime；锁内只做比较与记录，读文件和解析在锁外
    seen: Mutex<Option<SystemTime>>,
    doc: RwLock<Arc<RuleDocument>>,
}

impl RuleEngine {
    /// 创建并做一次初始加载（尚无 mtime 记录，必然加载）
    pub fn new(path: impl AsRef<Path>) -> Self {
        let engine = Self {
            path: path.as_ref().to_path_buf(),
            seen: Mutex::new(None),
            doc: RwLock::new(Arc::new(RuleDocument::default())),
        };
        engine.refresh();
        engine
    }

    /// mtime 前进时重新加载；返回是否替换了文档
    pub fn refresh(&self) -> bool {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "rule source not readable, keeping current rules"
                );
                return false;
            }
        };
        {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            if !(*seen).map_or(true, |prev| mtime > prev) {
                return false;
            }
            // 解析失败也记下 mtime，文件再次变更前不重复解析
            *seen = Some(mtime);
        }

        match RuleDocument::load(&self.path) {
            Ok(doc) => {
                let count = doc.rules.len();
                let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
                // 解析期间已有更新的 mtime 被认领，交给那次加载
                if *seen != Some(mtime) {
                    return false;
                }
                *self.doc.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(doc);
                drop(seen);
                tracing::info!(path = %self.path.display(), rules = count, "rules reloaded");
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "rule reload failed, keeping last good rules"
                );
                false
            }
        }
    }

    /// 当前规则快照
    pub fn snapshot(&self) -> Arc<RuleDocument> {
        let doc = self.doc.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*doc)
    }

    /// 匹配步骤文本，命中则返回规则给出的路由
    pub fn match_step(&self, step: &str) -> Option<Route> {
        let doc = self.snapshot();
        doc.matching(step)
            .map(|rule| Route::new(rule.tool.clone(), rule.params.clone()))
    }
}
