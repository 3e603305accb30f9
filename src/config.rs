//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `OMNISCOPE__*` 覆盖（双下划线表示嵌套，如 `OMNISCOPE__ENGINE__RETRIES=4`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::RetryPolicy;
use crate::learning::BreakerSettings;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub breaker: BreakerSection,
    pub rules: RulesSection,
    pub trace: TraceSection,
    pub tools: ToolsSection,
}

/// [engine] 段：引擎名、步骤上限、重试与退避、单次尝试超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// 引擎名（决定轨迹文件名）
    pub name: String,
    /// 单个任务最多执行的步骤数，多余步骤静默丢弃
    pub max_steps: usize,
    pub retries: u32,
    /// 第 n 次失败后等待 backoff_step_ms * n 毫秒
    pub backoff_step_ms: u64,
    pub attempt_timeout_secs: u64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            name: "scouty".to_string(),
            max_steps: 8,
            retries: 2,
            backoff_step_ms: 200,
            attempt_timeout_secs: 15,
        }
    }
}

impl EngineSection {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, Duration::from_millis(self.backoff_step_ms))
    }
}

/// [breaker] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerSection {
    pub window: u32,
    pub cool_down_ms: u64,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            window: 5,
            cool_down_ms: 5000,
        }
    }
}

impl BreakerSection {
    pub fn settings(&self) -> BreakerSettings {
        BreakerSettings {
            window: self.window.max(1),
            cool_down: Duration::from_millis(self.cool_down_ms),
        }
    }
}

/// [rules] 段：规则文档路径（.yaml / .yml / .toml）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    pub path: PathBuf,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/rules.yaml"),
        }
    }
}

/// [trace] 段：轨迹目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraceSection {
    pub dir: PathBuf,
}

impl Default for TraceSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("memory"),
        }
    }
}

/// [tools] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ToolsSection {
    pub python: PythonSection,
    pub http: HttpSection,
}

/// [tools.python] 段：解释器与子进程超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PythonSection {
    pub interpreter: String,
    pub timeout_secs: u64,
}

impl Default for PythonSection {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: 3,
        }
    }
}

/// [tools.http] 段：请求超时与响应体上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_body_bytes: 100_000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 OMNISCOPE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 OMNISCOPE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("OMNISCOPE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.engine.max_steps, 8);
        assert_eq!(cfg.engine.retry_policy().max_attempts(), 3);
        assert_eq!(cfg.breaker.settings(), BreakerSettings::default());
        assert_eq!(cfg.tools.python.interpreter, "python3");
        assert_eq!(cfg.tools.http.max_body_bytes, 100_000);
    }

    #[test]
    fn test_explicit_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[engine]\nname = \"reporter\"\nretries = 0\n\n[tools.python]\ntimeout_secs = 9\n",
        )
        .unwrap();
        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.engine.name, "reporter");
        assert_eq!(cfg.engine.retries, 0);
        // 未覆盖的键保持默认
        assert_eq!(cfg.engine.backoff_step_ms, 200);
        assert_eq!(cfg.tools.python.timeout_secs, 9);
        assert_eq!(cfg.tools.python.interpreter, "python3");
    }
}
