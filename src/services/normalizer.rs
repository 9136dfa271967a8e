//! 提取结果归一化 - 业务能力层
//!
//! 把逐页的提取结果展开成一个有序的题目列表

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{QuestionRecord, RawExtractionPage};

/// 归一化提取结果
///
/// - 结构化页：每道识别出的题目生成一条记录，题号缺失时使用
///   "已生成记录数 + 1"（跨页累计）
/// - 纯文本页：整页生成一条记录，页面文本作为答案，题号等于页码
///
/// 纯文本页按页码编号，与累计编号混用时可能出现重复或倒序的题号，
/// 这里保持原样，不做去重。
///
/// 结果为空，或所有记录的题干和答案都是空白时，返回 `EmptyExtraction`。
pub fn normalize(pages: &[RawExtractionPage]) -> AppResult<Vec<QuestionRecord>> {
    let mut records: Vec<QuestionRecord> = Vec::new();

    for page in pages {
        match page {
            RawExtractionPage::Structured {
                page_number, items, ..
            } => {
                for item in items {
                    let question_number = item
                        .question_number
                        .unwrap_or(records.len() as i64 + 1);
                    records.push(QuestionRecord::new(
                        *page_number,
                        question_number,
                        item.question_text.clone().unwrap_or_default(),
                        item.answer_text.clone().unwrap_or_default(),
                    ));
                }
            }
            RawExtractionPage::Plain {
                page_number,
                plain_text,
            } => {
                records.push(QuestionRecord::new(
                    *page_number,
                    i64::from(*page_number),
                    String::new(),
                    plain_text.clone(),
                ));
            }
        }
    }

    if records.iter().all(QuestionRecord::is_blank) {
        return Err(AppError::empty_extraction("提取结果"));
    }

    debug!("归一化完成: {} 页 → {} 条题目记录", pages.len(), records.len());
    Ok(records)
}
