//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 命令行阅卷任务
//! - 管理应用生命周期（初始化、运行）
//! - 按顺序驱动三个阶段
//! - 输出统计信息、记录失败题目、保存报告
//!
//! ### `session` - 阅卷会话
//! - 持有上下文、阶段状态机和学生试卷数据
//! - 对外暴露用户的每一个操作
//! - 丢弃过期的评分批次
//!
//! ### `scoring_dispatcher` - 评分调度器
//! - 遍历一份试卷的所有题目记录
//! - 逐题复用 QuestionFlow，严格串行
//!
//! ## 层次关系
//!
//! ```text
//! app (一次命令行任务)
//!     ↓
//! session (一次阅卷会话)
//!     ↓
//! scoring_dispatcher (处理 Vec<QuestionRecord>)
//!     ↓
//! workflow::QuestionFlow (处理单道题)
//!     ↓
//! services (能力层：提取 / 评分 / 报告)
//!     ↓
//! clients (HTTP 客户端)
//! ```

pub mod app;
pub mod scoring_dispatcher;
pub mod session;

// 重新导出主要类型
pub use app::{App, JobFiles};
pub use scoring_dispatcher::{ScoringDispatcher, ScoringStats};
pub use session::{CompletedBatch, ScoringBatch, Session};
