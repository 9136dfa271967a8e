use serde::{Deserialize, Serialize};
use std::fmt;

/// 评分流程阶段
///
/// 严格线性：答案 → 评分标准 → 学生试卷
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    AnswerKey,
    Rubric,
    StudentExam,
}

impl WorkflowStage {
    /// 全部阶段（按顺序）
    pub const ALL: [WorkflowStage; 3] = [
        WorkflowStage::AnswerKey,
        WorkflowStage::Rubric,
        WorkflowStage::StudentExam,
    ];

    pub fn next(self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::AnswerKey => Some(WorkflowStage::Rubric),
            WorkflowStage::Rubric => Some(WorkflowStage::StudentExam),
            WorkflowStage::StudentExam => None,
        }
    }

    pub fn previous(self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::AnswerKey => None,
            WorkflowStage::Rubric => Some(WorkflowStage::AnswerKey),
            WorkflowStage::StudentExam => Some(WorkflowStage::Rubric),
        }
    }

    /// 阶段序号（从 1 开始，用于日志）
    pub fn ordinal(self) -> usize {
        match self {
            WorkflowStage::AnswerKey => 1,
            WorkflowStage::Rubric => 2,
            WorkflowStage::StudentExam => 3,
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::AnswerKey => "答案",
            WorkflowStage::Rubric => "评分标准",
            WorkflowStage::StudentExam => "学生试卷",
        };
        write!(f, "{}", name)
    }
}

/// 学生试卷阶段内的子视图
///
/// 不单独存储，由当前数据推导：
/// - 没有题目记录 → `UploadPending`
/// - 有题目记录、没有评分结果 → `Review`
/// - 有评分结果 → `Scored`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentView {
    UploadPending,
    Review,
    Scored,
}
