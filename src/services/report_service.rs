//! 报告请求服务 - 业务能力层
//!
//! 只负责"打包评分结果并请求报告"，不关心流程

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use crate::error::{AppError, AppResult, ReportError};
use crate::models::{ReportArtifact, ReportItem, ReportRequest, ScoringOutcome, SubmissionId};
use crate::services::ports::ReportRenderer;

/// 报告请求服务
///
/// 职责：
/// - 校验提交编号
/// - 把评分结果转换为报告请求
/// - 调用报告服务，不重试，不检查返回文件的格式
pub struct ReportService {
    renderer: Arc<dyn ReportRenderer>,
}

impl ReportService {
    pub fn new(renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { renderer }
    }

    /// 请求报告
    ///
    /// # 参数
    /// - `submission_id`: 提交编号，缺失时直接失败，不会调用报告服务
    /// - `outcomes`: 评分结果（失败的题目同样计入报告）
    pub async fn request_report(
        &self,
        submission_id: Option<&SubmissionId>,
        outcomes: &[ScoringOutcome],
    ) -> AppResult<ReportArtifact> {
        let submission_id = submission_id.ok_or(ReportError::MissingSubmissionId)?;

        let request = ReportRequest {
            request_id: submission_id.to_string(),
            results: outcomes.iter().map(ReportItem::from).collect(),
        };

        info!(
            "📄 正在请求报告: 提交 {} | {} 道题目",
            submission_id,
            request.results.len()
        );

        let artifact = self.renderer.generate_report(&request).await.map_err(|e| {
            warn!("报告生成失败: {}", e);
            AppError::Report(e)
        })?;

        info!("✓ 报告已生成: {}", artifact.file_name);
        Ok(artifact)
    }
}

/// 根据提交编号生成默认文件名
///
/// 只保留字母、数字、`_` 和 `-`
pub fn suggested_file_name(submission_id: &str) -> String {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("valid regex"));

    let sanitized = re.replace_all(submission_id, "");
    if sanitized.is_empty() {
        "report.pdf".to_string()
    } else {
        format!("report_{}.pdf", sanitized)
    }
}

/// 从 `Content-Disposition` 头中解析文件名
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    static FILENAME: OnceLock<Regex> = OnceLock::new();
    let re = FILENAME
        .get_or_init(|| Regex::new(r#"filename\*?=(?:UTF-8'')?"?([^";]+)"?"#).expect("valid regex"));

    re.captures(header)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| {
            !name.contains('/') && !name.contains('\\') && !name.chars().all(|c| c == '.')
        })
}
