use serde::{Deserialize, Serialize};

use crate::models::question::QuestionRecord;

/// 单题评分明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    /// 语义相似度，范围 [0, 1]
    pub semantic_score: f64,
    pub logic_score: f64,
    pub max_score: f64,
    /// 服务端给出的最终得分（缺省时以 logic_score 为准）
    pub final_score: Option<f64>,
    pub comment: String,
}

impl ScoreDetail {
    pub fn new(
        semantic_score: f64,
        logic_score: f64,
        max_score: f64,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            semantic_score: clamp_unit(semantic_score),
            logic_score,
            max_score,
            final_score: None,
            comment: comment.into(),
        }
    }

    pub fn with_final_score(mut self, final_score: f64) -> Self {
        self.final_score = Some(final_score);
        self
    }

    /// 计入报告的得分
    pub fn awarded(&self) -> f64 {
        self.final_score.unwrap_or(self.logic_score)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// 单题评分结果：成功或失败，二者必居其一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutcomeResult {
    Scored(ScoreDetail),
    Failed { message: String },
}

/// 单题评分结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub question_number: i64,
    pub question_text: String,
    pub answer_text: String,
    pub result: OutcomeResult,
}

impl ScoringOutcome {
    pub fn scored(record: &QuestionRecord, detail: ScoreDetail) -> Self {
        Self::from_record(record, OutcomeResult::Scored(detail))
    }

    pub fn failed(record: &QuestionRecord, message: impl Into<String>) -> Self {
        Self::from_record(
            record,
            OutcomeResult::Failed {
                message: message.into(),
            },
        )
    }

    fn from_record(record: &QuestionRecord, result: OutcomeResult) -> Self {
        Self {
            question_number: record.question_number(),
            question_text: record.question_text.clone(),
            answer_text: record.answer_text.clone(),
            result,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.result, OutcomeResult::Scored(_))
    }

    pub fn detail(&self) -> Option<&ScoreDetail> {
        match &self.result {
            OutcomeResult::Scored(detail) => Some(detail),
            OutcomeResult::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.result {
            OutcomeResult::Scored(_) => None,
            OutcomeResult::Failed { message } => Some(message),
        }
    }
}

// ========== 线上格式 ==========

/// 单题评分请求（`/puanla-direkt`）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRequest {
    #[serde(rename = "soru_no")]
    pub question_number: i64,
    #[serde(rename = "soru_metni")]
    pub question_text: String,
    #[serde(rename = "ogrenci_cevabi")]
    pub answer_text: String,
    // 服务端要求该字段存在；参考答案统一通过 answer_key_text 传递
    #[serde(rename = "ideal_cevap")]
    ideal_answer: String,
    pub answer_key_text: String,
    pub rubric_text: String,
}

impl ScoreRequest {
    pub fn new(record: &QuestionRecord, answer_key_text: &str, rubric_text: &str) -> Self {
        Self {
            question_number: record.question_number(),
            question_text: record.question_text.clone(),
            answer_text: record.answer_text.clone(),
            ideal_answer: String::new(),
            answer_key_text: answer_key_text.to_string(),
            rubric_text: rubric_text.to_string(),
        }
    }
}

/// 单题评分响应
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub bert_skoru: f64,
    #[serde(default)]
    pub llm_skoru: f64,
    #[serde(default)]
    pub final_puan: Option<f64>,
    #[serde(default)]
    pub max_puan: Option<f64>,
    #[serde(default)]
    pub yorum: String,
}

/// 服务端未给出满分时使用的默认值
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

impl ScoreResponse {
    pub fn into_detail(self) -> ScoreDetail {
        let detail = ScoreDetail::new(
            self.bert_skoru,
            self.llm_skoru,
            self.max_puan.unwrap_or(DEFAULT_MAX_SCORE),
            self.yorum,
        );
        match self.final_puan {
            Some(final_score) => detail.with_final_score(final_score),
            None => detail,
        }
    }
}

/// 报告中的一题（`/create-report`）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub soru_no: i64,
    pub soru_metni: String,
    pub ogrenci_cevabi: String,
    pub final_puan: f64,
    pub max_puan: f64,
    pub yorum: String,
}

impl From<&ScoringOutcome> for ReportItem {
    fn from(outcome: &ScoringOutcome) -> Self {
        let (final_puan, max_puan, yorum) = match &outcome.result {
            OutcomeResult::Scored(detail) => {
                (detail.awarded(), detail.max_score, detail.comment.clone())
            }
            OutcomeResult::Failed { message } => {
                (0.0, DEFAULT_MAX_SCORE, format!("评分失败: {}", message))
            }
        };
        Self {
            soru_no: outcome.question_number,
            soru_metni: outcome.question_text.clone(),
            ogrenci_cevabi: outcome.answer_text.clone(),
            final_puan,
            max_puan,
            yorum,
        }
    }
}

/// 报告请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub request_id: String,
    pub results: Vec<ReportItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_request_wire_shape() {
        let record = QuestionRecord::new(1, 4, "Explain osmosis.", "Water moves...");
        let request = ScoreRequest::new(&record, "KEY", "RUBRIC");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "soru_no": 4,
                "soru_metni": "Explain osmosis.",
                "ogrenci_cevabi": "Water moves...",
                "ideal_cevap": "",
                "answer_key_text": "KEY",
                "rubric_text": "RUBRIC"
            })
        );
    }

    #[test]
    fn test_score_response_into_detail() {
        let response: ScoreResponse = serde_json::from_value(json!({
            "success": true,
            "bert_skoru": 1.7,
            "llm_skoru": 22.5,
            "final_puan": 24.0,
            "max_puan": 30,
            "yorum": "Mostly correct."
        }))
        .unwrap();

        let detail = response.into_detail();
        assert_eq!(detail.semantic_score, 1.0);
        assert_eq!(detail.logic_score, 22.5);
        assert_eq!(detail.max_score, 30.0);
        assert_eq!(detail.awarded(), 24.0);
        assert_eq!(detail.comment, "Mostly correct.");
    }

    #[test]
    fn test_missing_max_score_defaults() {
        let response: ScoreResponse =
            serde_json::from_value(json!({"llm_skoru": 50.0, "yorum": ""})).unwrap();
        let detail = response.into_detail();
        assert_eq!(detail.max_score, DEFAULT_MAX_SCORE);
        assert_eq!(detail.awarded(), 50.0);
    }

    #[test]
    fn test_failed_outcome_report_item() {
        let record = QuestionRecord::new(2, 5, "Q", "A");
        let outcome = ScoringOutcome::failed(&record, "timeout");
        assert!(!outcome.succeeded());
        assert_eq!(outcome.error_message(), Some("timeout"));

        let item = ReportItem::from(&outcome);
        assert_eq!(item.soru_no, 5);
        assert_eq!(item.final_puan, 0.0);
        assert!(item.yorum.contains("timeout"));
    }
}
