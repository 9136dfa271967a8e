//! 提取结果数据结构
//!
//! 分两部分：
//! - 领域类型：`RawExtractionPage` 等，供归一化使用
//! - 线上格式：`UploadResponse` 等，对应提取服务返回的 JSON

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// 提交编号
///
/// 由提取服务在识别学生试卷时返回，请求报告时必须携带
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 提取服务在某一页上识别出的一道题
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDetectedItem {
    pub question_number: Option<i64>,
    pub question_text: Option<String>,
    pub answer_text: Option<String>,
}

/// 提取服务返回的一页
///
/// 结构化页至少包含一道题；没有识别出题目的页一律视为纯文本页
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawExtractionPage {
    Structured {
        page_number: u32,
        plain_text: String,
        items: Vec<RawDetectedItem>,
    },
    Plain {
        page_number: u32,
        plain_text: String,
    },
}

impl RawExtractionPage {
    /// 根据识别结果构造页面，`items` 为空或缺失时得到纯文本页
    pub fn new(
        page_number: u32,
        plain_text: impl Into<String>,
        items: Option<Vec<RawDetectedItem>>,
    ) -> Self {
        let plain_text = plain_text.into();
        match items {
            Some(items) if !items.is_empty() => RawExtractionPage::Structured {
                page_number,
                plain_text,
                items,
            },
            _ => RawExtractionPage::Plain {
                page_number,
                plain_text,
            },
        }
    }

    pub fn page_number(&self) -> u32 {
        match self {
            RawExtractionPage::Structured { page_number, .. }
            | RawExtractionPage::Plain { page_number, .. } => *page_number,
        }
    }

    pub fn plain_text(&self) -> &str {
        match self {
            RawExtractionPage::Structured { plain_text, .. }
            | RawExtractionPage::Plain { plain_text, .. } => plain_text,
        }
    }
}

/// 一次提取的完整结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// 参考文本提取不返回提交编号
    pub submission_id: Option<SubmissionId>,
    pub pages: Vec<RawExtractionPage>,
}

impl Extraction {
    /// 把所有页面的文本拼成一段（页与页之间空一行）
    pub fn flatten_text(&self) -> String {
        self.pages
            .iter()
            .map(RawExtractionPage::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ========== 线上格式 ==========

/// `/upload` 响应
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub page_count: Option<usize>,
    #[serde(default)]
    pub pages: Vec<UploadPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadPage {
    pub page: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub structured_data: Option<Vec<DetectedItemDto>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectedItemDto {
    #[serde(default, deserialize_with = "deserialize_question_number")]
    pub soru_no: Option<i64>,
    #[serde(default)]
    pub soru_metni: Option<String>,
    #[serde(default)]
    pub ogrenci_cevabi: Option<String>,
}

impl From<DetectedItemDto> for RawDetectedItem {
    fn from(dto: DetectedItemDto) -> Self {
        Self {
            question_number: dto.soru_no,
            question_text: dto.soru_metni,
            answer_text: dto.ogrenci_cevabi,
        }
    }
}

impl UploadResponse {
    /// 转换为领域类型
    ///
    /// 页面级错误只记录日志，该页按纯文本页处理
    pub fn into_extraction(self) -> Extraction {
        let pages = self
            .pages
            .into_iter()
            .map(|page| {
                if let Some(err) = &page.error {
                    warn!("⚠️ 第 {} 页识别失败: {}", page.page, err);
                }
                let items = page
                    .structured_data
                    .map(|items| items.into_iter().map(RawDetectedItem::from).collect());
                RawExtractionPage::new(page.page, page.text.unwrap_or_default(), items)
            })
            .collect();

        Extraction {
            submission_id: Some(SubmissionId::new(self.id)),
            pages,
        }
    }
}

/// `/upload-generic` 响应（答案 / 评分标准）
#[derive(Debug, Clone, Deserialize)]
pub struct GenericUploadResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl GenericUploadResponse {
    pub fn into_extraction(self) -> Extraction {
        Extraction {
            submission_id: None,
            pages: vec![RawExtractionPage::new(1, self.text, None)],
        }
    }
}

// 题号可能是整数、数字字符串或 null
fn deserialize_question_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct QuestionNumberVisitor;

    impl<'de> Visitor<'de> for QuestionNumberVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer, a numeric string or null")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(i64::try_from(value).ok())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.fract() == 0.0 && value.is_finite() {
                Ok(Some(value as i64))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.trim().parse::<i64>().ok())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(QuestionNumberVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_response_decoding() {
        let body = json!({
            "id": "4f7c-req",
            "filename": "exam.pdf",
            "page_count": 3,
            "pages": [
                {
                    "page": 1,
                    "text": "1) ...",
                    "raw_text": "1) ...",
                    "normalized_text": "1) ...",
                    "structured_data": [
                        {"soru_no": 1, "soru_metni": "Define entropy.", "ogrenci_cevabi": "Disorder."},
                        {"soru_no": "2", "soru_metni": "State the first law.", "ogrenci_cevabi": null}
                    ]
                },
                {"page": 2, "text": "free text", "structured_data": []},
                {"page": 3, "text": "", "error": "vision timeout"}
            ]
        });

        let response: UploadResponse = serde_json::from_value(body).unwrap();
        let extraction = response.into_extraction();

        assert_eq!(extraction.submission_id, Some(SubmissionId::new("4f7c-req")));
        assert_eq!(extraction.pages.len(), 3);

        match &extraction.pages[0] {
            RawExtractionPage::Structured { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].question_number, Some(1));
                assert_eq!(items[1].question_number, Some(2));
                assert_eq!(items[1].answer_text, None);
            }
            other => panic!("第 1 页应为结构化页: {:?}", other),
        }
        assert!(matches!(
            extraction.pages[1],
            RawExtractionPage::Plain { page_number: 2, .. }
        ));
        assert!(matches!(
            extraction.pages[2],
            RawExtractionPage::Plain { page_number: 3, .. }
        ));
    }

    #[test]
    fn test_question_number_is_lenient() {
        let items: Vec<DetectedItemDto> = serde_json::from_value(json!([
            {"soru_no": 7},
            {"soru_no": " 8 "},
            {"soru_no": "iki"},
            {"soru_no": null},
            {"soru_no": 9.0},
            {}
        ]))
        .unwrap();

        let numbers: Vec<Option<i64>> = items.into_iter().map(|i| i.soru_no).collect();
        assert_eq!(numbers, vec![Some(7), Some(8), None, None, Some(9), None]);
    }

    #[test]
    fn test_generic_upload_becomes_single_plain_page() {
        let response: GenericUploadResponse = serde_json::from_value(json!({
            "success": true,
            "filename": "key.pdf",
            "text": "1. A\n2. C"
        }))
        .unwrap();

        let extraction = response.into_extraction();
        assert_eq!(extraction.submission_id, None);
        assert_eq!(extraction.flatten_text(), "1. A\n2. C");
    }

    #[test]
    fn test_flatten_text_joins_pages_with_blank_line() {
        let extraction = Extraction {
            submission_id: None,
            pages: vec![
                RawExtractionPage::new(1, "first", None),
                RawExtractionPage::new(2, "second", Some(vec![RawDetectedItem::default()])),
            ],
        };
        assert_eq!(extraction.flatten_text(), "first\n\nsecond");
    }
}
