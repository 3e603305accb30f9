//! 分派引擎：solve(task) 主流程
//!
//! task → plan → 每步：规则 / 关键词路由 → 熔断闸门 → UCB1 评分（仅记录）→ 带退避的有界重试
//! → 更新 UCB1 与熔断器（每步一次）→ 追加轨迹 → 成功输出作为下一步上下文。
//!
//! 所有可变状态（臂统计、熔断器、轨迹）归属于单个 Engine 实例，同一进程可并存多个引擎；
//! 多个 solve 可并发调用同一实例。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::{EngineError, ExecutionRecord, Outcome, RetryPolicy, StepStatus, ToolHealth};
use crate::learning::{BreakerBoard, Ucb1};
use crate::memory::{JsonlTraceSink, TraceSink};
use crate::routing::{plan, RuleEngine, Router};
use crate::tools::{builtin_registry, Tool, ToolCall, ToolExecutor, ToolRegistry};

/// 熔断跳过时写入记录的原因
pub const CIRCUIT_OPEN: &str = "circuit open";

/// 引擎构建器：默认注册内置工具、按引擎名落盘轨迹
pub struct EngineBuilder {
    config: AppConfig,
    registry: ToolRegistry,
    sink: Option<Arc<dyn TraceSink>>,
}

impl EngineBuilder {
    pub fn new(config: AppConfig) -> Self {
        let registry = builtin_registry(&config.tools);
        Self {
            config,
            registry,
            sink: None,
        }
    }

    /// 追加（或覆盖同名）工具
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.registry.register(tool);
        self
    }

    /// 整体替换工具表（不含内置工具）
    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Engine {
        let cfg = self.config;
        let sink = self.sink.unwrap_or_else(|| {
            Arc::new(JsonlTraceSink::for_engine(&cfg.trace.dir, &cfg.engine.name))
        });
        let executor = ToolExecutor::new(
            self.registry,
            Duration::from_secs(cfg.engine.attempt_timeout_secs),
        );
        tracing::info!(
            engine = %cfg.engine.name,
            tools = ?executor.tool_names(),
            rules = %cfg.rules.path.display(),
            "engine built"
        );
        Engine {
            name: cfg.engine.name.clone(),
            max_steps: cfg.engine.max_steps,
            retry: cfg.engine.retry_policy(),
            router: Router::new(RuleEngine::new(&cfg.rules.path)),
            executor,
            bandit: Ucb1::new(),
            breakers: BreakerBoard::new(cfg.breaker.settings()),
            sink,
        }
    }
}

/// 自适应步骤分派引擎
pub struct Engine {
    name: String,
    max_steps: usize,
    retry: RetryPolicy,
    router: Router,
    executor: ToolExecutor,
    bandit: Ucb1,
    breakers: BreakerBoard,
    sink: Arc<dyn TraceSink>,
}

impl Engine {
    pub fn builder(config: AppConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn from_config(config: AppConfig) -> Self {
        EngineBuilder::new(config).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已注册工具的名称与描述（按名称排序）
    pub fn tools(&self) -> Vec<(String, String)> {
        self.executor.tool_descriptions()
    }

    /// 执行一个任务；从不失败，最坏情况是所有步骤失败、result 为 None
    pub async fn solve(&self, task: &str) -> Outcome {
        let run_id = Uuid::new_v4();
        let steps = plan(task);
        if steps.len() > self.max_steps {
            tracing::debug!(
                run_id = %run_id,
                planned = steps.len(),
                max_steps = self.max_steps,
                "step cap reached, extra steps dropped"
            );
        }
        tracing::info!(
            engine = %self.name,
            run_id = %run_id,
            steps = steps.len().min(self.max_steps),
            "solve start"
        );

        let mut last_ok: Option<String> = None;
        let mut transcript = Vec::new();
        for (index, step) in steps.iter().take(self.max_steps).enumerate() {
            let record = self
                .run_step(run_id, task, index, step, last_ok.as_deref())
                .await;
            if let Err(e) = self.sink.store(&record).await {
                tracing::warn!(run_id = %run_id, error = %e, "trace append failed");
            }
            if record.ok() {
                last_ok = record.output.clone();
            }
            transcript.push(record);
        }

        tracing::info!(
            engine = %self.name,
            run_id = %run_id,
            ok = last_ok.is_some(),
            "solve done"
        );
        Outcome {
            task: task.to_string(),
            result: last_ok,
            transcript,
        }
    }

    async fn run_step(
        &self,
        run_id: Uuid,
        task: &str,
        index: usize,
        step: &str,
        context: Option<&str>,
    ) -> ExecutionRecord {
        let route = self.router.route(step);
        let mut record = ExecutionRecord {
            ts: Utc::now(),
            run_id,
            task: task.to_string(),
            step_index: index,
            step: step.to_string(),
            tool: route.tool.clone(),
            params: route.params.clone(),
            status: StepStatus::Skipped,
            attempts: 0,
            score: None,
            output: None,
            error: None,
        };

        if self.breakers.is_open(&route.tool) {
            tracing::info!(
                run_id = %run_id,
                step = index,
                tool = %route.tool,
                "step skipped: circuit open"
            );
            record.error = Some(CIRCUIT_OPEN.to_string());
            return record;
        }

        record.score = Some(self.bandit.choose(&route.tool));
        let call = ToolCall::new(step)
            .with_params(route.params)
            .with_context(context.map(str::to_string));
        let (attempts, result) = self.attempt(&route.tool, &call).await;

        let ok = result.is_ok();
        self.bandit.update(&route.tool, ok);
        self.breakers.record(&route.tool, ok);

        record.ts = Utc::now();
        record.attempts = attempts;
        match result {
            Ok(output) => {
                record.status = StepStatus::Success;
                record.output = Some(output);
            }
            Err(e) => {
                record.status = StepStatus::Failed;
                record.error = Some(e.to_string());
            }
        }
        record
    }

    /// 有界重试：成功即停；不可重试错误立即返回；最后一次失败后不再等待
    async fn attempt(&self, tool: &str, call: &ToolCall) -> (u32, Result<String, EngineError>) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.executor.execute(tool, call).await {
                Ok(out) => return (attempt, Ok(out)),
                Err(e) if !e.is_retryable() => return (attempt, Err(e)),
                Err(e) => match self.retry.backoff_after(attempt) {
                    Some(wait) => {
                        tracing::warn!(
                            tool = %tool,
                            attempt,
                            wait_ms = wait.as_millis() as u64,
                            error = %e,
                            "tool attempt failed, retrying"
                        );
                        tokio::time::sleep(wait).await;
                    }
                    None => return (attempt, Err(e)),
                },
            }
        }
    }

    /// 诊断：熔断状态与臂统计
    pub fn health(&self, tool: &str) -> ToolHealth {
        let (open, consecutive_failures) = self.breakers.snapshot(tool);
        let arm = self.bandit.stats(tool);
        ToolHealth {
            open,
            consecutive_failures,
            trials: arm.trials,
            reward: arm.reward,
        }
    }

    /// 读回轨迹中的全部记录（文件顺序）
    pub async fn trace(&self) -> Result<Vec<ExecutionRecord>, EngineError> {
        self.sink.all().await
    }
}
