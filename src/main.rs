//! OmniScope 命令行入口
//!
//! 初始化日志、加载配置、构建引擎，然后执行 solve / health / trace / tools 子命令，结果以 JSON 打印到 stdout。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use omniscope::{config::load_config, observability, Engine};

/// 自适应步骤分派引擎
#[derive(Parser, Debug)]
#[command(name = "omniscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON 格式日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 执行一个任务
    Solve {
        /// 任务文本（多个参数以空格拼接）
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },
    /// 查看某个工具的熔断 / 统计状态
    Health { tool: String },
    /// 打印轨迹文件中的全部记录
    Trace,
    /// 列出已注册的工具及其描述
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.json_logs {
        observability::init_json();
    } else {
        observability::init();
    }

    let cfg = load_config(cli.config.clone()).context("Failed to load config")?;
    let engine = Engine::from_config(cfg);

    match cli.command {
        Command::Solve { task } => {
            let outcome = engine.solve(&task.join(" ")).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Health { tool } => {
            println!("{}", serde_json::to_string_pretty(&engine.health(&tool))?);
        }
        Command::Trace => {
            let records = engine.trace().await.context("Failed to read trace")?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Tools => {
            let tools: Vec<_> = engine
                .tools()
                .into_iter()
                .map(|(name, description)| {
                    serde_json::json!({ "name": name, "description": description })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
    }
    Ok(())
}
