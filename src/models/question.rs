use serde::{Deserialize, Serialize};

/// 题目记录：归一化之后的最小处理单元
///
/// `page_number` 和 `question_number` 创建后不可修改，
/// 题干和答案允许用户在评分前编辑。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    page_number: u32,
    question_number: i64,
    pub question_text: String,
    pub answer_text: String,
}

impl QuestionRecord {
    pub fn new(
        page_number: u32,
        question_number: i64,
        question_text: impl Into<String>,
        answer_text: impl Into<String>,
    ) -> Self {
        Self {
            page_number,
            question_number,
            question_text: question_text.into(),
            answer_text: answer_text.into(),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn question_number(&self) -> i64 {
        self.question_number
    }

    /// 答案是否为空白（空白答案不参与评分）
    pub fn has_blank_answer(&self) -> bool {
        self.answer_text.trim().is_empty()
    }

    /// 题干和答案是否都为空白
    pub fn is_blank(&self) -> bool {
        self.has_blank_answer() && self.question_text.trim().is_empty()
    }
}

impl std::fmt::Display for QuestionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第 {} 页 题目#{}]", self.page_number, self.question_number)
    }
}
