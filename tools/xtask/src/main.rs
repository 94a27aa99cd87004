//! # xtask - 开发辅助工具
//!
//! 提供本地质量门禁与开发辅助命令。
//!
//! ## 命令
//!
//! - `check-all`: 运行 fmt、clippy、test
//! - `cov-runtime`: 运行 collapse-runtime 覆盖率
//! - `cov-workspace`: 运行 workspace 覆盖率
//! - `page-check`: 检查页面描述文件（解析、候选节点、文档高度）

use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use collapse_runtime::{CandidateSelector, NodeTemplate, Surface};
use walkdir::WalkDir;

fn run(step: &str, cmd: &mut Command) -> anyhow::Result<()> {
    eprintln!("\n==> {step}");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{step} failed with {status}");
    }
    Ok(())
}

fn ensure_cargo_llvm_cov_available() -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["llvm-cov", "--version"]);
    let status = cmd.status();
    match status {
        Ok(s) if s.success() => Ok(()),
        _ => anyhow::bail!(
            "cargo llvm-cov 不可用。\n\
请先安装：\n\
  - cargo install cargo-llvm-cov\n\
  - rustup component add llvm-tools-preview\n\
然后重试。"
        ),
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("xtask error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let sub = args.next().unwrap_or_else(|| "help".to_string());

    match sub.as_str() {
        "check-all" => {
            let mut fmt = Command::new("cargo");
            fmt.args(["fmt", "--all", "--", "--check"]);
            run("cargo fmt --all -- --check", &mut fmt)?;

            let mut clippy = Command::new("cargo");
            clippy.args(["clippy", "--workspace", "--all-targets"]);
            run("cargo clippy --workspace --all-targets", &mut clippy)?;

            let mut test = Command::new("cargo");
            test.args(["test", "--workspace"]);
            run("cargo test --workspace", &mut test)?;
        }
        "cov-runtime" => {
            ensure_cargo_llvm_cov_available()?;

            let mut cov = Command::new("cargo");
            cov.args(["llvm-cov", "-p", "collapse-runtime", "--all-features", "--html"]);
            run(
                "cargo llvm-cov -p collapse-runtime --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "cov-workspace" => {
            ensure_cargo_llvm_cov_available()?;

            // workspace 覆盖率只用于趋势观察，排除 xtask
            let mut cov = Command::new("cargo");
            cov.args([
                "llvm-cov",
                "--workspace",
                "--exclude",
                "xtask",
                "--all-features",
                "--html",
            ]);
            run(
                "cargo llvm-cov --workspace --exclude xtask --all-features --html",
                &mut cov,
            )?;

            eprintln!("\nCoverage HTML: target/llvm-cov/html/index.html");
        }
        "page-check" => {
            let path = args.next();
            page_check(path.as_deref())?;
        }
        "help" | "-h" | "--help" => {
            print_help();
        }
        other => anyhow::bail!("unknown xtask subcommand: {other}"),
    }

    Ok(())
}

fn print_help() {
    eprintln!(
        r#"xtask - 开发辅助工具

USAGE:
  cargo xtask <command>

COMMANDS:
  check-all       运行 fmt、clippy、test 门禁检查
  cov-runtime     运行 collapse-runtime 覆盖率报告
  cov-workspace   运行 workspace 覆盖率报告
  page-check      检查页面描述文件

PAGE-CHECK:
  cargo xtask page-check [path]

  不带参数：检查 assets/pages/ 下所有 .json 文件
  带路径参数：检查指定文件或目录

  检查内容：
    - 页面 JSON 能否解析为节点模板
    - 折叠候选节点数量（为 0 时警告）
    - 布局后的文档高度（为 0 时警告）

ALIASES (in .cargo/config.toml):
  cargo check-all     -> cargo xtask check-all
  cargo cov-runtime   -> cargo xtask cov-runtime
  cargo cov-workspace -> cargo xtask cov-workspace
  cargo page-check    -> cargo xtask page-check
"#
    );
}

//=============================================================================
// page-check 命令实现
//=============================================================================

/// 默认页面目录（相对于 workspace root）
const PAGES_DIR: &str = "assets/pages";

/// 单个页面的检查结果
struct PageSummary {
    nodes: usize,
    candidates: usize,
    document_height: f64,
}

/// 页面检查结果
#[derive(Default)]
struct PageCheckResult {
    pages_checked: usize,
    errors: usize,
    warnings: usize,
}

/// 执行页面检查
fn page_check(path: Option<&str>) -> anyhow::Result<()> {
    let files = match path {
        Some(p) => {
            let path = PathBuf::from(p);
            if path.is_file() {
                vec![path]
            } else if path.is_dir() {
                collect_page_files(&path)
            } else {
                anyhow::bail!("路径不存在: {}", p);
            }
        }
        None => {
            let dir = Path::new(PAGES_DIR);
            if !dir.exists() {
                anyhow::bail!(
                    "默认页面目录不存在: {}\n请在 workspace 根目录运行，或指定页面路径",
                    dir.display()
                );
            }
            collect_page_files(dir)
        }
    };

    if files.is_empty() {
        eprintln!("未找到页面文件（.json）");
        return Ok(());
    }

    eprintln!("==> 检查 {} 个页面文件...\n", files.len());

    let mut result = PageCheckResult::default();
    for file in &files {
        result.pages_checked += 1;
        let page_id = file.display().to_string();

        match check_page_file(file) {
            Ok(summary) => {
                eprintln!(
                    "[OK] {}: {} 个节点, {} 个候选, 文档高度 {}",
                    page_id, summary.nodes, summary.candidates, summary.document_height
                );
                if summary.candidates == 0 {
                    eprintln!("[WARN] {}: 没有可折叠的节点", page_id);
                    result.warnings += 1;
                }
                if summary.document_height <= 0.0 {
                    eprintln!("[WARN] {}: 文档高度为 0，平移距离将退化为 0", page_id);
                    result.warnings += 1;
                }
            }
            Err(e) => {
                eprintln!("[ERROR] {}: {:#}", page_id, e);
                result.errors += 1;
            }
        }
    }

    print_check_result(&result);

    if result.errors > 0 {
        anyhow::bail!("页面检查发现错误");
    }

    Ok(())
}

/// 收集目录下的所有页面文件
fn collect_page_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// 检查单个页面文件：解析 → 挂到 body 下 → 布局 → 统计候选节点
fn check_page_file(file: &Path) -> anyhow::Result<PageSummary> {
    let content = std::fs::read_to_string(file)?;
    let page: NodeTemplate = serde_json::from_str(&content)?;

    // 不设置视口高度，文档高度只反映页面内容
    let mut surface = Surface::new();
    surface.instantiate(surface.body(), &page)?;
    surface.layout_blocks();

    let candidates = CandidateSelector::default().select(&surface, surface.body());
    Ok(PageSummary {
        nodes: page.node_count(),
        candidates: candidates.len(),
        document_height: surface.document_height(),
    })
}

/// 输出检查结果
fn print_check_result(result: &PageCheckResult) {
    eprintln!("─────────────────────────────────────────────────────");
    eprintln!("检查完成: {} 个页面", result.pages_checked);
    eprintln!();

    if result.errors > 0 {
        eprintln!("❌ {} 个错误, {} 个警告", result.errors, result.warnings);
    } else if result.warnings > 0 {
        eprintln!("⚠️  0 个错误, {} 个警告", result.warnings);
    } else {
        eprintln!("✅ 检查通过，无错误");
    }
}
