pub mod extraction;
pub mod outcome;
pub mod question;
pub mod reference;
pub mod stage;
pub mod upload;

pub use extraction::{Extraction, RawDetectedItem, RawExtractionPage, SubmissionId};
pub use outcome::{OutcomeResult, ReportItem, ReportRequest, ScoreDetail, ScoreRequest, ScoringOutcome};
pub use question::QuestionRecord;
pub use reference::{ReferenceKind, ReferenceText};
pub use stage::{StudentView, WorkflowStage};
pub use upload::{ReportArtifact, Upload};
