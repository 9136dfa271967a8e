//! 题目评分上下文
//!
//! 封装"正在用哪份答案和评分标准评第几题"这一信息

use std::fmt::Display;

/// 题目评分上下文
#[derive(Debug, Clone, Copy)]
pub struct QuestionCtx<'a> {
    /// 答案全文
    pub answer_key_text: &'a str,

    /// 评分标准全文
    pub rubric_text: &'a str,

    /// 在本批评分中的位置（从1开始，仅用于日志显示）
    pub position: usize,

    /// 本批需要评分的题目总数
    pub total: usize,
}

impl<'a> QuestionCtx<'a> {
    pub fn new(answer_key_text: &'a str, rubric_text: &'a str, position: usize, total: usize) -> Self {
        Self {
            answer_key_text,
            rubric_text,
            position,
            total,
        }
    }
}

impl Display for QuestionCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[评分 {}/{}]", self.position, self.total)
    }
}
