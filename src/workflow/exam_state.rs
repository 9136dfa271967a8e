//! 学生试卷阶段的数据
//!
//! 题目记录、评分结果、提交编号放在一起，只能通过命名的重置操作一起清空

use crate::error::WorkflowError;
use crate::models::{QuestionRecord, ScoringOutcome, StudentView, SubmissionId};

#[derive(Debug, Clone, Default)]
pub struct ExamState {
    records: Vec<QuestionRecord>,
    outcomes: Option<Vec<ScoringOutcome>>,
    submission_id: Option<SubmissionId>,
}

impl ExamState {
    /// 当前子视图，由数据推导
    pub fn view(&self) -> StudentView {
        if self.outcomes.is_some() {
            StudentView::Scored
        } else if !self.records.is_empty() {
            StudentView::Review
        } else {
            StudentView::UploadPending
        }
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn outcomes(&self) -> Option<&[ScoringOutcome]> {
        self.outcomes.as_deref()
    }

    pub fn submission_id(&self) -> Option<&SubmissionId> {
        self.submission_id.as_ref()
    }

    /// 空白答案数量（这些题目不会被评分）
    pub fn blank_answer_count(&self) -> usize {
        self.records.iter().filter(|r| r.has_blank_answer()).count()
    }

    /// 接收一次新的提取结果，之前的评分结果作废
    pub fn accept_extraction(
        &mut self,
        submission_id: Option<SubmissionId>,
        records: Vec<QuestionRecord>,
    ) {
        self.records = records;
        self.outcomes = None;
        self.submission_id = submission_id;
    }

    pub fn accept_outcomes(&mut self, outcomes: Vec<ScoringOutcome>) {
        self.outcomes = Some(outcomes);
    }

    /// 修改某条记录的题干或答案
    pub fn edit_record(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut QuestionRecord),
    ) -> Result<(), WorkflowError> {
        if self.outcomes.is_some() {
            return Err(WorkflowError::NotReady {
                action: "编辑题目",
                reason: "已经完成评分，请重新开始",
            });
        }
        let len = self.records.len();
        let record = self
            .records
            .get_mut(index)
            .ok_or(WorkflowError::RecordNotFound { index, len })?;
        edit(record);
        Ok(())
    }

    /// 清空全部学生试卷数据
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
