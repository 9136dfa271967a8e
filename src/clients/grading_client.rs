/// 评分后端 API 客户端
///
/// 封装所有与评分后端（提取 / 评分 / 报告）相关的 HTTP 调用。
/// 所有请求都只发送一次，失败时直接返回错误，不做重试。
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ExtractionError, ReportError, ScoringError};
use crate::models::extraction::{GenericUploadResponse, UploadResponse};
use crate::models::outcome::ScoreResponse;
use crate::models::{Extraction, ReportArtifact, ReportRequest, ScoreDetail, ScoreRequest, Upload};
use crate::services::ports::{ExtractionPurpose, Extractor, ReportRenderer, Scorer};
use crate::services::report_service::{file_name_from_disposition, suggested_file_name};
use crate::utils::logging::truncate_text;

/// 评分后端客户端
pub struct GradingClient {
    http: Client,
    config: Config,
}

impl GradingClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        self.config.endpoint_url(endpoint)
    }
}

#[async_trait]
impl Extractor for GradingClient {
    async fn extract(
        &self,
        upload: &Upload,
        purpose: ExtractionPurpose,
    ) -> Result<Extraction, ExtractionError> {
        let endpoint = match purpose {
            ExtractionPurpose::Reference(_) => self.config.reference_upload_endpoint.clone(),
            ExtractionPurpose::Submission => self.config.upload_endpoint.clone(),
        };
        let url = self.url(&endpoint);

        debug!(
            "上传文件: {} ({}, {} 字节) → {}",
            upload.file_name(),
            upload.content_type(),
            upload.bytes().len(),
            url
        );

        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.content_type())
            .map_err(|e| ExtractionError::RequestFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::RequestFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response).await;
            warn!("提取服务返回错误 HTTP {}: {}", status.as_u16(), detail);
            return Err(ExtractionError::BadResponse {
                endpoint,
                status: status.as_u16(),
                detail,
            });
        }

        let invalid = |e: reqwest::Error| ExtractionError::InvalidPayload {
            endpoint: endpoint.clone(),
            source: Box::new(e),
        };

        let extraction = match purpose {
            ExtractionPurpose::Reference(_) => response
                .json::<GenericUploadResponse>()
                .await
                .map_err(invalid)?
                .into_extraction(),
            ExtractionPurpose::Submission => response
                .json::<UploadResponse>()
                .await
                .map_err(invalid)?
                .into_extraction(),
        };

        debug!("提取完成: {} 页", extraction.pages.len());
        Ok(extraction)
    }
}

#[async_trait]
impl Scorer for GradingClient {
    async fn score_one(&self, request: &ScoreRequest) -> Result<ScoreDetail, ScoringError> {
        let question_number = request.question_number;
        let url = self.url(&self.config.score_endpoint);

        debug!(
            "评分请求: 题目#{} 答案: {}",
            question_number,
            truncate_text(&request.answer_text, 40)
        );

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ScoringError::RequestFailed {
                question_number,
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::BadResponse {
                question_number,
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }

        let body: ScoreResponse =
            response
                .json()
                .await
                .map_err(|e| ScoringError::InvalidPayload {
                    question_number,
                    source: Box::new(e),
                })?;

        if body.success == Some(false) {
            let detail = if body.yorum.trim().is_empty() {
                "评分服务返回 success=false".to_string()
            } else {
                body.yorum
            };
            return Err(ScoringError::Rejected {
                question_number,
                detail,
            });
        }

        Ok(body.into_detail())
    }
}

#[async_trait]
impl ReportRenderer for GradingClient {
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportArtifact, ReportError> {
        let url = self.url(&self.config.report_endpoint);

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ReportError::RequestFailed { source: Box::new(e) })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::BadResponse {
                status: status.as_u16(),
                detail: error_detail(response).await,
            });
        }

        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| suggested_file_name(&request.request_id));
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReportError::RequestFailed { source: Box::new(e) })?;

        Ok(ReportArtifact {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// 读取错误响应中的可读信息
///
/// 后端错误格式为 `{"detail": "..."}`，其他情况退回到响应文本或状态码
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    detail_from_body(status, &text)
}

fn detail_from_body(status: StatusCode, text: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(text) {
        match body.get("detail") {
            Some(Value::String(detail)) => return detail.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }

    if !text.trim().is_empty() {
        return truncate_text(text.trim(), 200);
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
