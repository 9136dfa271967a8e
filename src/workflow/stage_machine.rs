//! 阶段状态机
//!
//! 答案 → 评分标准 → 学生试卷，两个方向都只能由用户操作触发。
//! 前进条件每次都重新计算（用户可能在识别完成后又修改了文本）。

use crate::error::WorkflowError;
use crate::models::{ReferenceKind, WorkflowStage};
use crate::workflow::context::ContextStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMachine {
    current: WorkflowStage,
}

impl StageMachine {
    pub fn new() -> Self {
        Self {
            current: WorkflowStage::AnswerKey,
        }
    }

    pub fn current(&self) -> WorkflowStage {
        self.current
    }

    /// 检查当前阶段是否可以前进
    pub fn check_advance(&self, context: &ContextStore) -> Result<WorkflowStage, WorkflowError> {
        let next = self.current.next().ok_or(WorkflowError::NoNextStage)?;

        match self.current {
            WorkflowStage::AnswerKey if context.reference(ReferenceKind::AnswerKey).is_blank() => {
                Err(WorkflowError::GuardRejected {
                    from: self.current,
                    reason: "答案内容为空",
                })
            }
            WorkflowStage::Rubric if context.reference(ReferenceKind::Rubric).is_blank() => {
                Err(WorkflowError::GuardRejected {
                    from: self.current,
                    reason: "评分标准内容为空",
                })
            }
            _ => Ok(next),
        }
    }

    /// 前进到下一阶段
    pub fn advance(&mut self, context: &ContextStore) -> Result<WorkflowStage, WorkflowError> {
        let next = self.check_advance(context)?;
        self.current = next;
        Ok(next)
    }

    /// 返回上一阶段，已经在第一个阶段时不做任何事并返回 `None`
    pub fn go_back(&mut self) -> Option<WorkflowStage> {
        let previous = self.current.previous()?;
        self.current = previous;
        Some(previous)
    }

    /// 确认当前处于指定阶段
    pub fn require(&self, expected: WorkflowStage) -> Result<(), WorkflowError> {
        if self.current == expected {
            Ok(())
        } else {
            Err(WorkflowError::WrongStage {
                expected,
                actual: self.current,
            })
        }
    }
}

impl Default for StageMachine {
    fn default() -> Self {
        Self::new()
    }
}
