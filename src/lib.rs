//! # Exam Grading Flow
//!
//! 三阶段阅卷客户端：答案 → 评分标准 → 学生试卷
//!
//! 文本提取、单题评分和报告生成都由远程服务完成，
//! 本 crate 负责采集参考文本、归一化题目记录、逐题调度评分并请求报告。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 唯一与 HTTP 打交道的地方
//! - `GradingClient` - 实现提取、评分、报告三个服务接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `normalize` - 把提取结果整理为题目记录
//! - `ReportService` - 打包评分结果并请求报告
//! - `FailureWriter` - 写评分失败记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 上下文、阶段状态机、"一道题"的评分流程
//! - `QuestionCtx` - 上下文封装（参考文本 + 题目位置）
//! - `QuestionFlow` - 单题评分（组装请求 → 评分 → 结果）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 阅卷会话，对外暴露用户操作
//! - `orchestrator/scoring_dispatcher` - 逐题串行评分
//! - `orchestrator/app` - 命令行任务
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::GradingClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{QuestionRecord, ReferenceKind, ScoringOutcome, StudentView, WorkflowStage};
pub use orchestrator::{App, JobFiles, ScoringDispatcher, Session};
pub use workflow::{QuestionCtx, QuestionFlow};
