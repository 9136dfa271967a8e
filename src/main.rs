use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use exam_grading_flow::utils::logging;
use exam_grading_flow::{App, Config, JobFiles};

/// 三阶段阅卷：答案 → 评分标准 → 学生试卷
#[derive(Debug, Parser)]
#[command(name = "exam-grading-flow", version, about)]
struct Cli {
    /// 答案文件（PDF / 图片，或 .txt / .md 纯文本）
    #[arg(long)]
    answer_key: PathBuf,

    /// 评分标准文件（PDF / 图片，或 .txt / .md 纯文本）
    #[arg(long)]
    rubric: PathBuf,

    /// 学生试卷（PDF / 图片）
    #[arg(long)]
    exam: PathBuf,

    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 报告保存目录，覆盖配置
    #[arg(long)]
    out: Option<String>,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(out) = cli.out {
        config.output_dir = out;
    }
    config.verbose_logging |= cli.verbose;

    // 初始化日志
    logging::init(config.verbose_logging);

    let job = JobFiles {
        answer_key: cli.answer_key,
        rubric: cli.rubric,
        exam: cli.exam,
    };

    // 初始化并运行应用
    App::initialize(config).await?.run(&job).await?;

    Ok(())
}
