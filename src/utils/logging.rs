/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::{OutcomeResult, ScoringOutcome, WorkflowStage};

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，未设置时按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 测试中可能重复初始化
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
    {
        debug!("日志已初始化，跳过: {}", e);
    }
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n评分日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 把评分结果追加到日志文件
pub fn append_outcomes(log_file_path: &str, outcomes: &[ScoringOutcome]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    for outcome in outcomes {
        writeln!(file, "{}", format_outcome_line(outcome))?;
    }
    writeln!(
        file,
        "\n完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 三阶段评分流程");
    info!("🌐 评分后端: {}", config.api_base_url);
    info!("📁 报告目录: {}", config.output_dir);
    info!("{}", "=".repeat(60));
}

/// 记录阶段切换
pub fn log_stage_change(from: WorkflowStage, to: WorkflowStage) {
    info!(
        "➡️ 阶段切换: [{}/3 {}] → [{}/3 {}]",
        from.ordinal(),
        from,
        to.ordinal(),
        to
    );
}

/// 打印评分统计信息
pub fn print_outcome_summary(outcomes: &[ScoringOutcome], skipped: usize) {
    let success = outcomes.iter().filter(|o| o.succeeded()).count();
    let failed = outcomes.len() - success;

    info!("\n{}", "=".repeat(60));
    info!("📊 评分完成统计");
    info!("{}", "=".repeat(60));
    for outcome in outcomes {
        info!("{}", format_outcome_line(outcome));
    }
    info!("{}", "─".repeat(60));
    info!("✅ 成功: {}/{}", success, outcomes.len());
    info!("❌ 失败: {}", failed);
    info!("⏭️ 空白未评分: {}", skipped);
    info!("{}", "=".repeat(60));
}

fn format_outcome_line(outcome: &ScoringOutcome) -> String {
    match &outcome.result {
        OutcomeResult::Scored(detail) => format!(
            "题目#{} ✓ {:.1}/{:.1} | {}",
            outcome.question_number,
            detail.awarded(),
            detail.max_score,
            truncate_text(&detail.comment, 60)
        ),
        OutcomeResult::Failed { message } => {
            format!("题目#{} ✗ {}", outcome.question_number, message)
        }
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
