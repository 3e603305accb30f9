//! 执行记录与 solve 结果
//!
//! ExecutionRecord 每步一条，追加写入轨迹；Outcome 汇总一次 solve 的最终输出与完整轨迹。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// 步骤结果：成功 / 失败（重试耗尽或未知工具）/ 熔断跳过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    Skipped,
}

/// 单步执行记录（只追加，从不修改）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub ts: DateTime<Utc>,
    /// 同一次 solve 的所有记录共享 run_id
    pub run_id: Uuid,
    pub task: String,
    pub step_index: usize,
    pub step: String,
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    pub status: StepStatus,
    /// 实际尝试次数；熔断跳过时为 0
    pub attempts: u32,
    /// UCB1 评分（仅记录，不参与路由）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn ok(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// solve 的返回值：原任务、最后一次成功输出、按步骤顺序的轨迹
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub task: String,
    pub result: Option<String>,
    pub transcript: Vec<ExecutionRecord>,
}

/// 单个工具的健康状况（供诊断）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolHealth {
    pub open: bool,
    pub consecutive_failures: u32,
    pub trials: u64,
    pub reward: f64,
}
