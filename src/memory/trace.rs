//! 执行轨迹：只追加的 JSONL 日志
//!
//! 每条 ExecutionRecord 一行；写入串行化（同一 sink 一把锁），从不改写或压缩已有内容。
//! all() 全量按文件顺序读回，仅供审计 / 调试。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::{EngineError, ExecutionRecord};

/// 轨迹存储抽象：追加一条、全量读回
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn store(&self, record: &ExecutionRecord) -> Result<(), EngineError>;

    async fn all(&self) -> Result<Vec<ExecutionRecord>, EngineError>;
}

/// 文件实现：`<dir>/trace_<name>.jsonl`
#[derive(Debug)]
pub struct JsonlTraceSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTraceSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// 按引擎名在目录下定位轨迹文件
    pub fn for_engine(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(dir.as_ref().join(format!("trace_{}.jsonl", name)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn trace_err(path: &Path, e: impl std::fmt::Display) -> EngineError {
    EngineError::Trace(format!("{}: {}", path.display(), e))
}

#[async_trait]
impl TraceSink for JsonlTraceSink {
    async fn store(&self, record: &ExecutionRecord) -> Result<(), EngineError> {
        let mut line = serde_json::to_string(record).map_err(|e| trace_err(&self.path, e))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| trace_err(&self.path, e))?;
            }
        }
        let mut f = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| trace_err(&self.path, e))?;
        f.write_all(line.as_bytes())
            .await
            .map_err(|e| trace_err(&self.path, e))?;
        f.flush().await.map_err(|e| trace_err(&self.path, e))
    }

    async fn all(&self) -> Result<Vec<ExecutionRecord>, EngineError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(trace_err(&self.path, e)),
        };
        data.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| trace_err(&self.path, format!("line {}: {}", i + 1, e)))
            })
            .collect()
    }
}

/// 内存实现（测试、或不需要落盘的场景）
#[derive(Debug, Default)]
pub struct InMemoryTraceSink {
    records: Mutex<Vec<ExecutionRecord>>,
}

impl InMemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TraceSink for InMemoryTraceSink {
    async fn store(&self, record: &ExecutionRecord) -> Result<(), EngineError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn all(&self) -> Result<Vec<ExecutionRecord>, EngineError> {
        Ok(self.records.lock().await.clone())
    }
}
