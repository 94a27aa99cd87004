//! collapse-demo - headless 折叠演示
//!
//! 构建演示页面，执行一次折叠并逐帧推进到完成，
//! 随后恢复页面并以 JSON 输出报告。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use collapse_host::{HostConfig, load_page, logging, run_demo};
use tracing::{info, warn};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "collapse-demo", about = "headless 页面折叠演示")]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// 页面描述文件（JSON），覆盖配置
    #[arg(long)]
    page: Option<PathBuf>,

    /// 总时长（毫秒）
    #[arg(long)]
    duration_ms: Option<f64>,

    /// 随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 每帧时长（毫秒）
    #[arg(long)]
    tick_ms: Option<f64>,

    /// 完成后保持折叠状态，不恢复页面
    #[arg(long)]
    keep_collapsed: bool,

    /// 输出 debug 日志
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("collapse-demo error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = HostConfig::try_load(&cli.config);
    let mut config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => HostConfig::default(),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.debug.log_level.as_str()
    };
    logging::init(level);

    match loaded {
        Ok(Some(_)) => info!(path = ?cli.config, "配置文件加载成功"),
        Ok(None) => warn!(path = ?cli.config, "配置文件不存在，使用默认配置"),
        Err(e) => warn!(path = ?cli.config, error = %e, "配置文件加载失败，使用默认配置"),
    }

    // 命令行参数覆盖配置
    if let Some(duration_ms) = cli.duration_ms {
        config.collapse.duration_ms = duration_ms;
    }
    if let Some(seed) = cli.seed {
        config.demo.seed = Some(seed);
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.demo.tick_ms = tick_ms;
    }
    if let Some(page) = cli.page {
        config.demo.page_path = Some(page);
    }
    if cli.keep_collapsed {
        config.demo.restore_after_finish = false;
    }
    config.validate()?;

    let page = match &config.demo.page_path {
        Some(path) => {
            info!(path = ?path, "加载页面文件");
            load_page(path)?
        }
        None => collapse_host::demo_page(),
    };

    let report = run_demo(&config, &page)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.round_trip_ok == Some(false) {
        anyhow::bail!("恢复后的样式与折叠前不一致");
    }
    Ok(())
}
