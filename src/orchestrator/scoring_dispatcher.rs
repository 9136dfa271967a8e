//! 评分调度器 - 编排层
//!
//! ## 职责
//!
//! 遍历一份学生试卷的全部题目记录，逐题调用 `QuestionFlow` 完成评分。
//!
//! ## 核心规则
//!
//! 1. **跳过空白答案**：答案为空白的题目不发请求，也不出现在结果中
//! 2. **严格串行**：上一题的结果（成功或失败）记录下来之后才开始下一题，
//!    同一时刻最多只有一个评分请求
//! 3. **失败隔离**：单题失败只产生一条失败结果，后面的题目照常评分
//! 4. **一次性交付**：全部题目处理完之后才返回完整的结果列表，顺序与输入一致

use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{QuestionRecord, ScoringOutcome};
use crate::services::Scorer;
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 评分统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScoringStats {
    pub scored: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 评分调度器
#[derive(Clone)]
pub struct ScoringDispatcher {
    scorer: Arc<dyn Scorer>,
}

impl ScoringDispatcher {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// 对全部题目记录评分
    ///
    /// # 参数
    /// - `records`: 归一化后的题目记录
    /// - `answer_key_text`: 答案全文
    /// - `rubric_text`: 评分标准全文
    ///
    /// # 返回
    /// 每道非空白答案对应一条结果，顺序与输入一致
    pub async fn score_all(
        &self,
        records: &[QuestionRecord],
        answer_key_text: &str,
        rubric_text: &str,
    ) -> Vec<ScoringOutcome> {
        let flow = QuestionFlow::new(self.scorer.clone());

        let scorable: Vec<&QuestionRecord> = records
            .iter()
            .filter(|record| {
                if record.has_blank_answer() {
                    debug!("{} 答案为空白，跳过评分", record);
                    false
                } else {
                    true
                }
            })
            .collect();

        let mut stats = ScoringStats {
            skipped: records.len() - scorable.len(),
            ..Default::default()
        };
        log_batch_start(scorable.len(), stats.skipped);

        let total = scorable.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, record) in scorable.into_iter().enumerate() {
            let ctx = QuestionCtx::new(answer_key_text, rubric_text, index + 1, total);

            let outcome = flow.run(record, &ctx).await;
            if outcome.succeeded() {
                stats.scored += 1;
            } else {
                stats.failed += 1;
            }
            outcomes.push(outcome);
        }

        log_batch_complete(&stats);
        outcomes
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(total: usize, skipped: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📝 开始评分: {} 道题目 (空白跳过 {} 道)", total, skipped);
}

fn log_batch_complete(stats: &ScoringStats) {
    info!(
        "✓ 评分结束: 成功 {}, 失败 {}, 跳过 {}",
        stats.scored, stats.failed, stats.skipped
    );
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use crate::models::{ScoreDetail, ScoreRequest};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// 按调用顺序（从1开始）决定成功或失败的评分服务
    struct ScriptedScorer {
        fail_calls: HashSet<usize>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<ScoreRequest>>,
    }

    impl ScriptedScorer {
        fn failing_on(calls: &[usize]) -> Self {
            Self {
                fail_calls: calls.iter().copied().collect(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Scorer for ScriptedScorer {
        async fn score_one(&self, request: &ScoreRequest) -> Result<ScoreDetail, ScoringError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());

            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_calls.contains(&call) {
                Err(ScoringError::RequestFailed {
                    question_number: request.question_number,
                    source: Box::new(std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "network error",
                    )),
                })
            } else {
                Ok(ScoreDetail::new(0.9, call as f64, 10.0, format!("call {}", call)))
            }
        }
    }

    fn records(answers: &[&str]) -> Vec<QuestionRecord> {
        answers
            .iter()
            .enumerate()
            .map(|(i, a)| QuestionRecord::new(1, i as i64 + 1, format!("Q{}", i + 1), *a))
            .collect()
    }

    #[tokio::test]
    async fn test_blank_answers_are_omitted() {
        let scorer = Arc::new(ScriptedScorer::failing_on(&[]));
        let dispatcher = ScoringDispatcher::new(scorer.clone());

        let outcomes = dispatcher
            .score_all(&records(&["a", "", "  \n", "d"]), "KEY", "RUBRIC")
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes.iter().map(|o| o.question_number).collect::<Vec<_>>(),
            vec![1, 4]
        );
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_preserved() {
        let scorer = Arc::new(ScriptedScorer::failing_on(&[2]));
        let dispatcher = ScoringDispatcher::new(scorer.clone());

        let outcomes = dispatcher
            .score_all(&records(&["a", "b", "c"]), "KEY", "RUBRIC")
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].succeeded());
        assert!(!outcomes[1].succeeded());
        assert!(outcomes[1].error_message().unwrap().contains("network error"));
        assert!(outcomes[2].succeeded());
        assert_eq!(
            outcomes.iter().map(|o| o.question_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_requests_are_strictly_sequential() {
        let scorer = Arc::new(ScriptedScorer::failing_on(&[1, 3]));
        let dispatcher = ScoringDispatcher::new(scorer.clone());

        dispatcher
            .score_all(&records(&["a", "b", "c", "d", "e"]), "KEY", "RUBRIC")
            .await;

        assert_eq!(scorer.max_in_flight.load(Ordering::SeqCst), 1);
        let seen = scorer.seen.lock().unwrap();
        assert_eq!(
            seen.iter().map(|r| r.question_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[tokio::test]
    async fn test_reference_texts_travel_with_every_request() {
        let scorer = Arc::new(ScriptedScorer::failing_on(&[]));
        let dispatcher = ScoringDispatcher::new(scorer.clone());

        dispatcher
            .score_all(&records(&["a", "b"]), "ANSWER KEY", "RUBRIC TEXT")
            .await;

        for request in scorer.seen.lock().unwrap().iter() {
            assert_eq!(request.answer_key_text, "ANSWER KEY");
            assert_eq!(request.rubric_text, "RUBRIC TEXT");
        }
    }

    #[tokio::test]
    async fn test_no_records_no_requests() {
        let scorer = Arc::new(ScriptedScorer::failing_on(&[]));
        let dispatcher = ScoringDispatcher::new(scorer.clone());

        assert!(dispatcher.score_all(&[], "K", "R").await.is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }
}
