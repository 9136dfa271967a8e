//! 外部协作服务接口
//!
//! 提取、评分、报告三个远程服务在这里抽象成 trait，
//! 生产环境由 `clients::GradingClient` 实现，测试中可替换为内存实现。

use async_trait::async_trait;

use crate::error::{ExtractionError, ReportError, ScoringError};
use crate::models::{
    Extraction, ReferenceKind, ReportArtifact, ReportRequest, ScoreDetail, ScoreRequest, Upload,
};

/// 提取用途
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPurpose {
    /// 答案 / 评分标准：只需要全文
    Reference(ReferenceKind),
    /// 学生试卷：需要逐题结构和提交编号
    Submission,
}

/// 文本提取服务
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        upload: &Upload,
        purpose: ExtractionPurpose,
    ) -> Result<Extraction, ExtractionError>;
}

/// 单题评分服务
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score_one(&self, request: &ScoreRequest) -> Result<ScoreDetail, ScoringError>;
}

/// 报告生成服务
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportArtifact, ReportError>;
}
