//! 评分失败记录服务 - 业务能力层
//!
//! 只负责"把评分失败的题目写入文件"，方便阅卷人事后人工复核

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::models::{ScoringOutcome, SubmissionId};

/// 评分失败记录服务
///
/// 职责：
/// - 追加写入失败题目的编号和原因
/// - 成功的结果直接忽略
pub struct FailureWriter {
    failure_file_path: String,
}

impl FailureWriter {
    pub fn new() -> Self {
        Self {
            failure_file_path: "scoring_failures.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            failure_file_path: path.into(),
        }
    }

    /// 写入所有失败的评分结果，返回写入的条数
    pub fn write_failures(
        &self,
        submission_id: Option<&SubmissionId>,
        outcomes: &[ScoringOutcome],
    ) -> Result<usize> {
        let failures: Vec<(i64, &str)> = outcomes
            .iter()
            .filter_map(|o| o.error_message().map(|msg| (o.question_number, msg)))
            .collect();

        if failures.is_empty() {
            return Ok(0);
        }

        debug!(
            "写入评分失败记录: {} 条 → {}",
            failures.len(),
            self.failure_file_path
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.failure_file_path)?;

        let submission = submission_id.map(SubmissionId::as_str).unwrap_or("-");
        for (question_number, message) in &failures {
            writeln!(
                file,
                "提交 {} | 题目 {} | 原因: {}",
                submission, question_number, message
            )?;
        }

        Ok(failures.len())
    }
}

impl Default for FailureWriter {
    fn default() -> Self {
        Self::new()
    }
}
