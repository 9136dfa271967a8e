use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// 评分后端地址
    pub api_base_url: String,
    /// 学生试卷提取接口
    pub upload_endpoint: String,
    /// 答案 / 评分标准提取接口
    pub reference_upload_endpoint: String,
    /// 单题评分接口
    pub score_endpoint: String,
    /// 报告生成接口
    pub report_endpoint: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 报告保存目录
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 评分失败记录文件
    pub failure_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            upload_endpoint: "/upload".to_string(),
            reference_upload_endpoint: "/upload-generic".to_string(),
            score_endpoint: "/puanla-direkt".to_string(),
            report_endpoint: "/create-report".to_string(),
            // OCR 和 LLM 评分都比较慢
            request_timeout_secs: 300,
            output_dir: "reports".to_string(),
            verbose_logging: false,
            output_log_file: "grading_log.txt".to_string(),
            failure_log_file: "scoring_failures.txt".to_string(),
        }
    }
}

/// TOML 配置文件，所有字段可选，缺省项使用默认值
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_base_url: Option<String>,
    upload_endpoint: Option<String>,
    reference_upload_endpoint: Option<String>,
    score_endpoint: Option<String>,
    report_endpoint: Option<String>,
    request_timeout_secs: Option<u64>,
    output_dir: Option<String>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
    failure_log_file: Option<String>,
}

impl Config {
    /// 从环境变量读取（未设置的项使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 读取 TOML 配置文件（可选），再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 读取 TOML 配置文件
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content).map_err(|source| ConfigError::ParseFailed {
            path: origin.to_string(),
            source,
        })?;

        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            upload_endpoint: file.upload_endpoint.unwrap_or(default.upload_endpoint),
            reference_upload_endpoint: file
                .reference_upload_endpoint
                .unwrap_or(default.reference_upload_endpoint),
            score_endpoint: file.score_endpoint.unwrap_or(default.score_endpoint),
            report_endpoint: file.report_endpoint.unwrap_or(default.report_endpoint),
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(default.request_timeout_secs),
            output_dir: file.output_dir.unwrap_or(default.output_dir),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
            failure_log_file: file.failure_log_file.unwrap_or(default.failure_log_file),
        })
    }

    fn with_env_overrides(self) -> Self {
        Self::with_overrides_from(self, |name| std::env::var(name).ok())
    }

    fn with_overrides_from(self, var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_base_url: var("GRADING_API_BASE_URL").unwrap_or(self.api_base_url),
            upload_endpoint: var("GRADING_UPLOAD_ENDPOINT").unwrap_or(self.upload_endpoint),
            reference_upload_endpoint: var("GRADING_REFERENCE_UPLOAD_ENDPOINT")
                .unwrap_or(self.reference_upload_endpoint),
            score_endpoint: var("GRADING_SCORE_ENDPOINT").unwrap_or(self.score_endpoint),
            report_endpoint: var("GRADING_REPORT_ENDPOINT").unwrap_or(self.report_endpoint),
            request_timeout_secs: var("GRADING_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.request_timeout_secs),
            output_dir: var("GRADING_OUTPUT_DIR").unwrap_or(self.output_dir),
            verbose_logging: var("GRADING_VERBOSE_LOGGING")
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
            output_log_file: var("GRADING_OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            failure_log_file: var("GRADING_FAILURE_LOG_FILE").unwrap_or(self.failure_log_file),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 拼接完整接口地址
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}
