pub mod context;
pub mod exam_state;
pub mod question_ctx;
pub mod question_flow;
pub mod stage_machine;

pub use context::ContextStore;
pub use exam_state::ExamState;
pub use question_ctx::QuestionCtx;
pub use question_flow::QuestionFlow;
pub use stage_machine::StageMachine;
