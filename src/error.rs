use thiserror::Error;

use crate::models::WorkflowStage;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 提取服务拒绝或无法读取文件
    #[error("提取失败: {0}")]
    Extraction(#[from] ExtractionError),
    /// 提取服务调用成功，但没有得到任何可用文本
    #[error("提取结果为空: {source_name} 中没有识别出任何可用文本")]
    EmptyExtraction { source_name: String },
    /// 单题评分失败（只在单题范围内出现，不会中断整批评分）
    #[error("评分失败: {0}")]
    Scoring(#[from] ScoringError),
    /// 报告生成失败
    #[error("报告生成失败: {0}")]
    Report(#[from] ReportError),
    /// 流程状态错误
    #[error("流程错误: {0}")]
    Workflow(#[from] WorkflowError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 提取相关错误
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 不支持的文件类型
    #[error("不支持的文件类型: {file_name} (仅支持 PDF / PNG / JPG)")]
    UnsupportedFile { file_name: String },
    /// 读取本地文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 网络请求失败
    #[error("提取请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
    /// 服务返回非成功状态
    #[error("提取服务返回错误 ({endpoint}, HTTP {status}): {detail}")]
    BadResponse {
        endpoint: String,
        status: u16,
        detail: String,
    },
    /// 响应体无法解析
    #[error("提取响应解析失败 ({endpoint}): {source}")]
    InvalidPayload {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

/// 单题评分错误
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("题目 {question_number} 评分请求失败: {source}")]
    RequestFailed {
        question_number: i64,
        #[source]
        source: BoxError,
    },
    #[error("题目 {question_number} 评分服务返回错误 (HTTP {status}): {detail}")]
    BadResponse {
        question_number: i64,
        status: u16,
        detail: String,
    },
    #[error("题目 {question_number} 评分响应解析失败: {source}")]
    InvalidPayload {
        question_number: i64,
        #[source]
        source: BoxError,
    },
    /// 服务返回 success=false
    #[error("题目 {question_number} 评分被拒绝: {detail}")]
    Rejected { question_number: i64, detail: String },
}

impl ScoringError {
    /// 展示给用户的错误信息
    ///
    /// 服务端给出了 detail 时直接使用 detail，否则使用完整的错误描述
    pub fn user_message(&self) -> String {
        match self {
            ScoringError::BadResponse { detail, .. } | ScoringError::Rejected { detail, .. } => {
                detail.clone()
            }
            other => other.to_string(),
        }
    }
}

/// 报告生成错误
#[derive(Debug, Error)]
pub enum ReportError {
    /// 还没有成功提取过学生试卷
    #[error("缺少提交编号，请先完成学生试卷的提取")]
    MissingSubmissionId,
    #[error("报告请求失败: {source}")]
    RequestFailed {
        #[source]
        source: BoxError,
    },
    #[error("报告服务返回错误 (HTTP {status}): {detail}")]
    BadResponse { status: u16, detail: String },
    #[error("保存报告失败 ({path}): {source}")]
    SaveFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 流程状态错误
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 前进条件不满足
    #[error("无法离开 {from} 阶段: {reason}")]
    GuardRejected {
        from: WorkflowStage,
        reason: &'static str,
    },
    #[error("已经是最后一个阶段")]
    NoNextStage,
    #[error("当前阶段为 {actual}，该操作需要在 {expected} 阶段进行")]
    WrongStage {
        expected: WorkflowStage,
        actual: WorkflowStage,
    },
    #[error("无法执行 {action}: {reason}")]
    NotReady {
        action: &'static str,
        reason: &'static str,
    },
    #[error("题目记录 {index} 不存在 (共 {len} 条)")]
    RecordNotFound { index: usize, len: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建提取请求失败错误
    pub fn extraction_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Extraction(ExtractionError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建提取结果为空错误
    pub fn empty_extraction(source_name: impl Into<String>) -> Self {
        AppError::EmptyExtraction {
            source_name: source_name.into(),
        }
    }

    /// 创建报告请求失败错误
    pub fn report_request_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Report(ReportError::RequestFailed {
            source: Box::new(source),
        })
    }

    /// 是否属于应当原样展示给用户的提取类错误
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, AppError::Extraction(_) | AppError::EmptyExtraction { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
