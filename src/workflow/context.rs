//! 全局上下文
//!
//! 保存两份参考文本（答案 / 评分标准）和各阶段当前选中的文件，
//! 除了修改和重置之外不包含任何逻辑

use crate::models::{ReferenceKind, ReferenceText, Upload, WorkflowStage};

#[derive(Debug, Clone)]
pub struct ContextStore {
    answer_key: ReferenceText,
    rubric: ReferenceText,
    answer_key_file: Option<Upload>,
    rubric_file: Option<Upload>,
    exam_file: Option<Upload>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            answer_key: ReferenceText::empty(ReferenceKind::AnswerKey),
            rubric: ReferenceText::empty(ReferenceKind::Rubric),
            answer_key_file: None,
            rubric_file: None,
            exam_file: None,
        }
    }

    pub fn reference(&self, kind: ReferenceKind) -> &ReferenceText {
        match kind {
            ReferenceKind::AnswerKey => &self.answer_key,
            ReferenceKind::Rubric => &self.rubric,
        }
    }

    pub fn answer_key_text(&self) -> &str {
        self.answer_key.content()
    }

    pub fn rubric_text(&self) -> &str {
        self.rubric.content()
    }

    /// 整体替换参考文本（重新提取或手动编辑）
    pub fn replace_reference(&mut self, kind: ReferenceKind, content: impl Into<String>) {
        match kind {
            ReferenceKind::AnswerKey => self.answer_key.replace(content),
            ReferenceKind::Rubric => self.rubric.replace(content),
        }
    }

    /// 选择某个阶段的文件，替换之前的选择
    pub fn select_file(&mut self, stage: WorkflowStage, upload: Upload) {
        *self.file_slot(stage) = Some(upload);
    }

    pub fn selected_file(&self, stage: WorkflowStage) -> Option<&Upload> {
        match stage {
            WorkflowStage::AnswerKey => self.answer_key_file.as_ref(),
            WorkflowStage::Rubric => self.rubric_file.as_ref(),
            WorkflowStage::StudentExam => self.exam_file.as_ref(),
        }
    }

    pub fn clear_file(&mut self, stage: WorkflowStage) {
        *self.file_slot(stage) = None;
    }

    fn file_slot(&mut self, stage: WorkflowStage) -> &mut Option<Upload> {
        match stage {
            WorkflowStage::AnswerKey => &mut self.answer_key_file,
            WorkflowStage::Rubric => &mut self.rubric_file,
            WorkflowStage::StudentExam => &mut self.exam_file,
        }
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 参考文本对应的阶段
pub fn stage_for(kind: ReferenceKind) -> WorkflowStage {
    match kind {
        ReferenceKind::AnswerKey => WorkflowStage::AnswerKey,
        ReferenceKind::Rubric => WorkflowStage::Rubric,
    }
}
