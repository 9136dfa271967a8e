use serde::{Deserialize, Serialize};
use std::fmt;

/// 参考文本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    AnswerKey,
    Rubric,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::AnswerKey => write!(f, "答案"),
            ReferenceKind::Rubric => write!(f, "评分标准"),
        }
    }
}

/// 参考文本（答案 / 评分标准）
///
/// 只会被整体替换，不做局部合并
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceText {
    kind: ReferenceKind,
    content: String,
}

impl ReferenceText {
    /// 创建空的参考文本
    pub fn empty(kind: ReferenceKind) -> Self {
        Self {
            kind,
            content: String::new(),
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 整体替换内容
    pub fn replace(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// 内容是否为空（仅包含空白字符也视为空）
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}
