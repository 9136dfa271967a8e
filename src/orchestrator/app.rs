//! 命令行阅卷任务 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，按顺序驱动一次完整的阅卷会话：
//!
//! 1. **应用初始化**：日志文件、HTTP 客户端、会话
//! 2. **答案阶段**：读取答案文件（`.txt` / `.md` 直接作为文本，其余交给提取服务）
//! 3. **评分标准阶段**：同上
//! 4. **学生试卷阶段**：提取、评分、输出统计、记录失败题目
//! 5. **报告**：请求报告并保存到输出目录
//!
//! 任一步骤失败都会终止任务，评分阶段的单题失败除外。

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::GradingClient;
use crate::config::Config;
use crate::models::{ReferenceKind, Upload};
use crate::orchestrator::session::Session;
use crate::services::FailureWriter;
use crate::utils::logging::{append_outcomes, init_log_file, log_startup, print_outcome_summary};

/// 一次阅卷任务需要的三个文件
#[derive(Debug, Clone)]
pub struct JobFiles {
    pub answer_key: PathBuf,
    pub rubric: PathBuf,
    pub exam: PathBuf,
}

/// 应用主结构
pub struct App {
    config: Config,
    session: Session,
    failure_writer: FailureWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let client = Arc::new(GradingClient::new(&config)?);
        let session = Session::with_client(client);

        Ok(Self::with_session(config, session))
    }

    /// 使用现成的会话创建
    pub fn with_session(config: Config, session: Session) -> Self {
        let failure_writer = FailureWriter::with_path(config.failure_log_file.clone());
        Self {
            config,
            session,
            failure_writer,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// 运行一次完整的阅卷任务，返回报告的保存路径
    pub async fn run(&mut self, job: &JobFiles) -> Result<PathBuf> {
        self.load_reference(ReferenceKind::AnswerKey, &job.answer_key)
            .await?;
        self.session.advance()?;

        self.load_reference(ReferenceKind::Rubric, &job.rubric).await?;
        self.session.advance()?;

        let upload = Upload::from_path(&job.exam).await?;
        self.session.select_student_file(upload)?;
        self.session.ingest_submission().await?;

        self.session.score().await?;
        self.record_outcomes();

        let artifact = self.session.request_report().await?;
        let path = artifact
            .save_to(Path::new(&self.config.output_dir))
            .await?;

        info!("🎉 阅卷完成，报告: {}", path.display());
        Ok(path)
    }

    /// 读取答案或评分标准
    ///
    /// 纯文本文件直接作为手动编辑的内容，其余文件交给提取服务
    async fn load_reference(&mut self, kind: ReferenceKind, path: &Path) -> Result<()> {
        if is_plain_text(path) {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("读取{}失败: {}", kind, path.display()))?;
            info!("📄 已读取{}文本: {}", kind, path.display());
            self.session.edit_reference(kind, text)?;
            return Ok(());
        }

        let upload = Upload::from_path(path).await?;
        self.session.select_reference_file(kind, upload)?;
        self.session.extract_reference(kind).await?;
        Ok(())
    }

    /// 输出统计，写日志文件和失败记录，写入失败只警告
    fn record_outcomes(&self) {
        let outcomes = self.session.outcomes().unwrap_or_default();
        print_outcome_summary(outcomes, self.session.blank_answer_count());

        if let Err(e) = append_outcomes(&self.config.output_log_file, outcomes) {
            warn!("写入日志文件失败: {}", e);
        }

        match self
            .failure_writer
            .write_failures(self.session.submission_id(), outcomes)
        {
            Ok(0) => {}
            Ok(count) => warn!(
                "⚠️ {} 道题目评分失败，已记录到 {}",
                count, self.config.failure_log_file
            ),
            Err(e) => warn!("写入失败记录失败: {}", e),
        }
    }
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "txt" | "md"))
        .unwrap_or(false)
}
