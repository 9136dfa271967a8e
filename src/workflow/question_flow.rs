//! 单题评分流程 - 流程层
//!
//! 核心职责：定义"一道题"的评分流程
//!
//! 流程顺序：
//! 1. 组装评分请求（题目 + 答案 + 评分标准）
//! 2. 调用评分服务
//! 3. 成功 → 评分明细；失败 → 带错误信息的失败结果
//!
//! 任何错误都在这里被转换成失败结果，不会向上传播。

use std::sync::Arc;
use tracing::{error, info};

use crate::models::{QuestionRecord, ScoreRequest, ScoringOutcome};
use crate::services::Scorer;
use crate::utils::logging::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 单题评分流程
///
/// - 不持有任何题目列表
/// - 不关心题目的先后顺序
pub struct QuestionFlow {
    scorer: Arc<dyn Scorer>,
}

impl QuestionFlow {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub async fn run(&self, record: &QuestionRecord, ctx: &QuestionCtx<'_>) -> ScoringOutcome {
        self.log_answer(record, ctx);

        let request = ScoreRequest::new(record, ctx.answer_key_text, ctx.rubric_text);

        match self.scorer.score_one(&request).await {
            Ok(detail) => {
                info!(
                    "{} ✓ 题目#{} 得分 {:.1}/{:.1}",
                    ctx,
                    record.question_number(),
                    detail.awarded(),
                    detail.max_score
                );
                ScoringOutcome::scored(record, detail)
            }
            Err(e) => {
                error!("{} ❌ 题目#{} 评分失败: {}", ctx, record.question_number(), e);
                ScoringOutcome::failed(record, e.user_message())
            }
        }
    }

    // ========== 日志辅助方法 ==========

    fn log_answer(&self, record: &QuestionRecord, ctx: &QuestionCtx<'_>) {
        info!(
            "{} {} 答案: {}",
            ctx,
            record,
            truncate_text(&record.answer_text, 80)
        );
    }
}
