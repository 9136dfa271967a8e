//! 阅卷会话 - 编排层
//!
//! ## 职责
//!
//! 把上下文、阶段状态机、学生试卷数据和三个远程服务组装在一起，
//! 对外暴露用户能做的每一个操作。
//!
//! ## 评分批次
//!
//! 评分分成三步：`begin_scoring` 拍下当前数据的快照，`ScoringBatch::run`
//! 在不持有会话的情况下逐题评分，`complete_scoring` 把结果交回会话。
//! 会话每次丢弃学生数据时都会递增代号，代号不一致的批次结果直接丢弃。

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::GradingClient;
use crate::error::{AppError, AppResult, WorkflowError};
use crate::models::{
    QuestionRecord, ReferenceKind, ReportArtifact, ScoringOutcome, StudentView, SubmissionId,
    Upload, WorkflowStage,
};
use crate::orchestrator::scoring_dispatcher::ScoringDispatcher;
use crate::services::{normalize, ExtractionPurpose, Extractor, ReportRenderer, ReportService, Scorer};
use crate::utils::logging::log_stage_change;
use crate::workflow::context::stage_for;
use crate::workflow::{ContextStore, ExamState, StageMachine};

/// 一次完整的阅卷会话
pub struct Session {
    context: ContextStore,
    stages: StageMachine,
    exam: ExamState,
    extractor: Arc<dyn Extractor>,
    dispatcher: ScoringDispatcher,
    reports: ReportService,
    generation: u64,
}

/// 尚未执行的评分批次
///
/// 持有评分所需数据的副本，执行期间不借用会话
pub struct ScoringBatch {
    generation: u64,
    records: Vec<QuestionRecord>,
    answer_key_text: String,
    rubric_text: String,
    dispatcher: ScoringDispatcher,
}

impl ScoringBatch {
    /// 逐题评分，全部完成后返回
    pub async fn run(self) -> CompletedBatch {
        let outcomes = self
            .dispatcher
            .score_all(&self.records, &self.answer_key_text, &self.rubric_text)
            .await;

        CompletedBatch {
            generation: self.generation,
            outcomes,
        }
    }
}

/// 已完成的评分批次
pub struct CompletedBatch {
    generation: u64,
    outcomes: Vec<ScoringOutcome>,
}

impl CompletedBatch {
    pub fn outcomes(&self) -> &[ScoringOutcome] {
        &self.outcomes
    }
}

impl Session {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        scorer: Arc<dyn Scorer>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            context: ContextStore::new(),
            stages: StageMachine::new(),
            exam: ExamState::default(),
            extractor,
            dispatcher: ScoringDispatcher::new(scorer),
            reports: ReportService::new(renderer),
            generation: 0,
        }
    }

    /// 三个服务都由同一个 HTTP 客户端提供
    pub fn with_client(client: Arc<GradingClient>) -> Self {
        Self::new(client.clone(), client.clone(), client)
    }

    // ========== 查询 ==========

    pub fn stage(&self) -> WorkflowStage {
        self.stages.current()
    }

    pub fn student_view(&self) -> StudentView {
        self.exam.view()
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn records(&self) -> &[QuestionRecord] {
        self.exam.records()
    }

    pub fn outcomes(&self) -> Option<&[ScoringOutcome]> {
        self.exam.outcomes()
    }

    pub fn submission_id(&self) -> Option<&SubmissionId> {
        self.exam.submission_id()
    }

    pub fn blank_answer_count(&self) -> usize {
        self.exam.blank_answer_count()
    }

    // ========== 答案 / 评分标准 ==========

    /// 手动编辑参考文本，整体替换
    ///
    /// 只能在对应阶段修改
    pub fn edit_reference(
        &mut self,
        kind: ReferenceKind,
        content: impl Into<String>,
    ) -> AppResult<()> {
        self.stages.require(stage_for(kind))?;
        self.context.replace_reference(kind, content);
        debug!("{} 已手动修改", kind);
        Ok(())
    }

    /// 为答案或评分标准阶段选择文件
    pub fn select_reference_file(&mut self, kind: ReferenceKind, upload: Upload) -> AppResult<()> {
        self.stages.require(stage_for(kind))?;
        info!("📎 已选择{}文件: {}", kind, upload.file_name());
        self.context.select_file(stage_for(kind), upload);
        Ok(())
    }

    /// 提取已选文件的全文，成功后整体替换参考文本
    ///
    /// 提取失败或结果为空时，原有文本保持不变
    pub async fn extract_reference(&mut self, kind: ReferenceKind) -> AppResult<&str> {
        let stage = stage_for(kind);
        self.stages.require(stage)?;

        let upload = self
            .context
            .selected_file(stage)
            .cloned()
            .ok_or(WorkflowError::NotReady {
                action: "提取文本",
                reason: "尚未选择文件",
            })?;

        info!("🔍 正在提取{}: {}", kind, upload.file_name());
        let extraction = self
            .extractor
            .extract(&upload, ExtractionPurpose::Reference(kind))
            .await?;

        let text = extraction.flatten_text();
        if text.trim().is_empty() {
            warn!("⚠️ {} 中没有识别出任何文本", upload.file_name());
            return Err(AppError::empty_extraction(upload.file_name()));
        }

        info!("✓ {}提取完成: {} 个字符", kind, text.chars().count());
        self.context.replace_reference(kind, text);
        Ok(self.context.reference(kind).content())
    }

    // ========== 阶段导航 ==========

    pub fn advance(&mut self) -> AppResult<WorkflowStage> {
        let from = self.stages.current();
        let to = self.stages.advance(&self.context)?;
        log_stage_change(from, to);
        Ok(to)
    }

    /// 返回上一阶段，所有数据保持不变
    pub fn go_back(&mut self) -> Option<WorkflowStage> {
        let from = self.stages.current();
        let to = self.stages.go_back()?;
        log_stage_change(from, to);
        Some(to)
    }

    // ========== 学生试卷 ==========

    /// 选择学生试卷文件，之前的题目记录和评分结果全部作废
    pub fn select_student_file(&mut self, upload: Upload) -> AppResult<()> {
        self.stages.require(WorkflowStage::StudentExam)?;
        info!("📎 已选择学生试卷: {}", upload.file_name());

        self.context.select_file(WorkflowStage::StudentExam, upload);
        self.discard_exam_data();
        Ok(())
    }

    /// 提取学生试卷并归一化为题目记录，返回记录条数
    pub async fn ingest_submission(&mut self) -> AppResult<usize> {
        self.stages.require(WorkflowStage::StudentExam)?;

        let upload = self
            .context
            .selected_file(WorkflowStage::StudentExam)
            .cloned()
            .ok_or(WorkflowError::NotReady {
                action: "提取学生试卷",
                reason: "尚未选择文件",
            })?;

        info!("🔍 正在提取学生试卷: {}", upload.file_name());
        let extraction = self
            .extractor
            .extract(&upload, ExtractionPurpose::Submission)
            .await?;

        let records = normalize(&extraction.pages).map_err(|e| match e {
            AppError::EmptyExtraction { .. } => AppError::empty_extraction(upload.file_name()),
            other => other,
        })?;

        if extraction.submission_id.is_none() {
            warn!("⚠️ 提取结果没有提交编号，将无法生成报告");
        }

        let count = records.len();
        self.discard_exam_data();
        self.exam.accept_extraction(extraction.submission_id, records);

        info!(
            "✓ 学生试卷提取完成: {} 道题目 (空白答案 {} 道)",
            count,
            self.exam.blank_answer_count()
        );
        Ok(count)
    }

    pub fn edit_question_text(&mut self, index: usize, text: impl Into<String>) -> AppResult<()> {
        self.stages.require(WorkflowStage::StudentExam)?;
        let text = text.into();
        self.exam.edit_record(index, |r| r.question_text = text)?;
        self.generation += 1;
        Ok(())
    }

    pub fn edit_answer_text(&mut self, index: usize, text: impl Into<String>) -> AppResult<()> {
        self.stages.require(WorkflowStage::StudentExam)?;
        let text = text.into();
        self.exam.edit_record(index, |r| r.answer_text = text)?;
        self.generation += 1;
        Ok(())
    }

    // ========== 评分 ==========

    /// 拍下当前记录和参考文本，生成一个评分批次
    pub fn begin_scoring(&self) -> AppResult<ScoringBatch> {
        self.stages.require(WorkflowStage::StudentExam)?;

        if self.exam.records().is_empty() {
            return Err(WorkflowError::NotReady {
                action: "评分",
                reason: "尚未提取学生试卷",
            }
            .into());
        }

        Ok(ScoringBatch {
            generation: self.generation,
            records: self.exam.records().to_vec(),
            answer_key_text: self.context.answer_key_text().to_string(),
            rubric_text: self.context.rubric_text().to_string(),
            dispatcher: self.dispatcher.clone(),
        })
    }

    /// 交回评分结果
    ///
    /// 批次开始后学生数据被丢弃或修改过时返回 `false`，结果不会被采用
    pub fn complete_scoring(&mut self, batch: CompletedBatch) -> bool {
        if batch.generation != self.generation {
            info!("评分批次已过期，丢弃 {} 条结果", batch.outcomes.len());
            return false;
        }
        self.exam.accept_outcomes(batch.outcomes);
        true
    }

    /// 评分并采用结果
    pub async fn score(&mut self) -> AppResult<&[ScoringOutcome]> {
        let batch = self.begin_scoring()?;
        let completed = batch.run().await;
        self.complete_scoring(completed);
        Ok(self.exam.outcomes().unwrap_or_default())
    }

    // ========== 报告 ==========

    /// 请求报告，没有提交编号时不会调用报告服务
    pub async fn request_report(&self) -> AppResult<ReportArtifact> {
        self.reports
            .request_report(
                self.exam.submission_id(),
                self.exam.outcomes().unwrap_or_default(),
            )
            .await
    }

    /// 重新开始学生试卷阶段，答案和评分标准保持不变
    pub fn start_over(&mut self) -> AppResult<()> {
        self.stages.require(WorkflowStage::StudentExam)?;
        self.context.clear_file(WorkflowStage::StudentExam);
        self.discard_exam_data();
        info!("🔄 已清空学生试卷数据");
        Ok(())
    }

    fn discard_exam_data(&mut self) {
        self.exam.reset();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, ReportError, ScoringError};
    use crate::models::{
        Extraction, RawDetectedItem, RawExtractionPage, ReportRequest, ScoreDetail, ScoreRequest,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubExtractor {
        reference: Mutex<Option<Extraction>>,
        submission: Mutex<Option<Extraction>>,
    }

    impl StubExtractor {
        fn new(reference: &str, submission: Extraction) -> Self {
            Self {
                reference: Mutex::new(Some(Extraction {
                    submission_id: None,
                    pages: vec![RawExtractionPage::new(1, reference, None)],
                })),
                submission: Mutex::new(Some(submission)),
            }
        }
    }

    #[async_trait]
    impl Extractor for StubExtractor {
        async fn extract(
            &self,
            upload: &Upload,
            purpose: ExtractionPurpose,
        ) -> Result<Extraction, ExtractionError> {
            let slot = match purpose {
                ExtractionPurpose::Reference(_) => &self.reference,
                ExtractionPurpose::Submission => &self.submission,
            };
            slot.lock().unwrap().clone().ok_or(ExtractionError::BadResponse {
                endpoint: "/upload".to_string(),
                status: 500,
                detail: format!("cannot read {}", upload.file_name()),
            })
        }
    }

    struct FixedScorer;

    #[async_trait]
    impl Scorer for FixedScorer {
        async fn score_one(&self, request: &ScoreRequest) -> Result<ScoreDetail, ScoringError> {
            Ok(ScoreDetail::new(0.5, 7.0, 10.0, format!("q{}", request.question_number)))
        }
    }

    struct CountingRenderer {
        calls: Mutex<Vec<ReportRequest>>,
    }

    #[async_trait]
    impl ReportRenderer for CountingRenderer {
        async fn generate_report(
            &self,
            request: &ReportRequest,
        ) -> Result<ReportArtifact, ReportError> {
            self.calls.lock().unwrap().push(request.clone());
            Ok(ReportArtifact {
                file_name: format!("report_{}.pdf", request.request_id),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            })
        }
    }

    fn submission(id: Option<&str>) -> Extraction {
        let item = |n: i64, answer: &str| RawDetectedItem {
            question_number: Some(n),
            question_text: Some(format!("Q{}", n)),
            answer_text: Some(answer.to_string()),
        };
        Extraction {
            submission_id: id.map(SubmissionId::new),
            pages: vec![RawExtractionPage::new(
                1,
                "",
                Some(vec![item(1, "a"), item(2, ""), item(3, "c")]),
            )],
        }
    }

    fn session_with(extractor: StubExtractor) -> (Session, Arc<CountingRenderer>) {
        let renderer = Arc::new(CountingRenderer {
            calls: Mutex::new(Vec::new()),
        });
        let session = Session::new(Arc::new(extractor), Arc::new(FixedScorer), renderer.clone());
        (session, renderer)
    }

    fn pdf(name: &str) -> Upload {
        Upload::new(name, vec![1, 2, 3]).unwrap()
    }

    fn session_at_student_exam() -> (Session, Arc<CountingRenderer>) {
        let (mut session, renderer) =
            session_with(StubExtractor::new("reference", submission(Some("sub-1"))));
        session.edit_reference(ReferenceKind::AnswerKey, "key").unwrap();
        session.advance().unwrap();
        session.edit_reference(ReferenceKind::Rubric, "rubric").unwrap();
        session.advance().unwrap();
        (session, renderer)
    }

    #[tokio::test]
    async fn test_extract_reference_replaces_text() {
        let (mut session, _) = session_with(StubExtractor::new("1. B\n2. A", submission(None)));
        session.edit_reference(ReferenceKind::AnswerKey, "old").unwrap();
        session
            .select_reference_file(ReferenceKind::AnswerKey, pdf("key.pdf"))
            .unwrap();

        let text = session.extract_reference(ReferenceKind::AnswerKey).await.unwrap();
        assert_eq!(text, "1. B\n2. A");
    }

    #[tokio::test]
    async fn test_blank_reference_extraction_keeps_previous_text() {
        let (mut session, _) = session_with(StubExtractor::new("   ", submission(None)));
        session.edit_reference(ReferenceKind::AnswerKey, "kept").unwrap();
        session
            .select_reference_file(ReferenceKind::AnswerKey, pdf("key.pdf"))
            .unwrap();

        let err = session
            .extract_reference(ReferenceKind::AnswerKey)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyExtraction { ref source_name } if source_name == "key.pdf"));
        assert_eq!(session.context().answer_key_text(), "kept");
    }

    #[tokio::test]
    async fn test_failed_reference_extraction_keeps_previous_text() {
        let extractor = StubExtractor {
            reference: Mutex::new(None),
            submission: Mutex::new(None),
        };
        let (mut session, _) = session_with(extractor);
        session.edit_reference(ReferenceKind::AnswerKey, "kept").unwrap();
        session
            .select_reference_file(ReferenceKind::AnswerKey, pdf("key.pdf"))
            .unwrap();

        let err = session
            .extract_reference(ReferenceKind::AnswerKey)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Extraction(ExtractionError::BadResponse { status: 500, .. })
        ));
        assert_eq!(session.context().answer_key_text(), "kept");
        assert_eq!(session.stage(), WorkflowStage::AnswerKey);
    }

    #[tokio::test]
    async fn test_references_are_locked_outside_their_stage() {
        let (mut session, _) = session_at_student_exam();

        let err = session
            .edit_reference(ReferenceKind::AnswerKey, "   ")
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Workflow(WorkflowError::WrongStage {
                expected: WorkflowStage::AnswerKey,
                actual: WorkflowStage::StudentExam,
            })
        ));
        assert!(session.edit_reference(ReferenceKind::Rubric, "").is_err());
        assert_eq!(session.context().answer_key_text(), "key");
        assert_eq!(session.context().rubric_text(), "rubric");

        session.select_student_file(pdf("exam.pdf")).unwrap();
        session.ingest_submission().await.unwrap();
        let batch = session.begin_scoring().unwrap();
        assert_eq!(batch.answer_key_text, "key");
        assert_eq!(batch.rubric_text, "rubric");
    }

    #[tokio::test]
    async fn test_record_edits_require_student_stage() {
        let (mut session, _) = session_with(StubExtractor::new("x", submission(None)));
        assert!(matches!(
            session.edit_answer_text(0, "a"),
            Err(AppError::Workflow(WorkflowError::WrongStage { .. }))
        ));
        assert!(session.edit_question_text(0, "q").is_err());
    }

    /// 第一次调用失败，之后成功
    struct FlakyRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReportRenderer for FlakyRenderer {
        async fn generate_report(
            &self,
            request: &ReportRequest,
        ) -> Result<ReportArtifact, ReportError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(ReportError::BadResponse {
                    status: 502,
                    detail: "renderer unavailable".to_string(),
                });
            }
            Ok(ReportArtifact {
                file_name: format!("report_{}.pdf", request.request_id),
                content_type: "application/pdf".to_string(),
                bytes: b"%PDF".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn test_report_failure_keeps_outcomes_for_retry() {
        let renderer = Arc::new(FlakyRenderer {
            calls: AtomicUsize::new(0),
        });
        let mut session = Session::new(
            Arc::new(StubExtractor::new("ref", submission(Some("sub-9")))),
            Arc::new(FixedScorer),
            renderer.clone(),
        );
        session.edit_reference(ReferenceKind::AnswerKey, "key").unwrap();
        session.advance().unwrap();
        session.edit_reference(ReferenceKind::Rubric, "rubric").unwrap();
        session.advance().unwrap();
        session.select_student_file(pdf("exam.pdf")).unwrap();
        session.ingest_submission().await.unwrap();
        let scored = session.score().await.unwrap().to_vec();

        let err = session.request_report().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Report(ReportError::BadResponse { status: 502, .. })
        ));
        assert_eq!(session.outcomes(), Some(scored.as_slice()));
        assert_eq!(session.student_view(), StudentView::Scored);

        let artifact = session.request_report().await.unwrap();
        assert_eq!(artifact.file_name, "report_sub-9.pdf");
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reference_file_requires_matching_stage() {
        let (mut session, _) = session_with(StubExtractor::new("x", submission(None)));
        assert!(session
            .select_reference_file(ReferenceKind::Rubric, pdf("rubric.pdf"))
            .is_err());
        assert!(session.extract_reference(ReferenceKind::AnswerKey).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_score_and_report() {
        let (mut session, renderer) = session_at_student_exam();
        session.select_student_file(pdf("exam.pdf")).unwrap();

        assert_eq!(session.ingest_submission().await.unwrap(), 3);
        assert_eq!(session.student_view(), StudentView::Review);

        let outcomes = session.score().await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(session.student_view(), StudentView::Scored);

        let artifact = session.request_report().await.unwrap();
        assert_eq!(artifact.file_name, "report_sub-1.pdf");
        assert_eq!(renderer.calls.lock().unwrap()[0].results.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_batch_is_discarded() {
        let (mut session, _) = session_at_student_exam();
        session.select_student_file(pdf("exam.pdf")).unwrap();
        session.ingest_submission().await.unwrap();

        let batch = session.begin_scoring().unwrap();
        session.select_student_file(pdf("other.pdf")).unwrap();
        let completed = batch.run().await;
        assert_eq!(completed.outcomes().len(), 2);

        assert!(!session.complete_scoring(completed));
        assert!(session.outcomes().is_none());
        assert_eq!(session.student_view(), StudentView::UploadPending);
    }

    #[tokio::test]
    async fn test_edit_after_begin_invalidates_batch() {
        let (mut session, _) = session_at_student_exam();
        session.select_student_file(pdf("exam.pdf")).unwrap();
        session.ingest_submission().await.unwrap();

        let batch = session.begin_scoring().unwrap();
        session.edit_answer_text(1, "filled in").unwrap();
        assert!(!session.complete_scoring(batch.run().await));
        assert_eq!(session.records()[1].answer_text, "filled in");
    }

    #[tokio::test]
    async fn test_start_over_keeps_references() {
        let (mut session, _) = session_at_student_exam();
        session.select_student_file(pdf("exam.pdf")).unwrap();
        session.ingest_submission().await.unwrap();
        session.score().await.unwrap();

        session.start_over().unwrap();

        assert_eq!(session.stage(), WorkflowStage::StudentExam);
        assert_eq!(session.student_view(), StudentView::UploadPending);
        assert!(session.submission_id().is_none());
        assert_eq!(session.context().answer_key_text(), "key");
        assert_eq!(session.context().rubric_text(), "rubric");
        assert!(session
            .context()
            .selected_file(WorkflowStage::StudentExam)
            .is_none());
    }

    #[tokio::test]
    async fn test_scoring_requires_records() {
        let (session, _) = session_at_student_exam();
        assert!(matches!(
            session.begin_scoring(),
            Err(AppError::Workflow(WorkflowError::NotReady { .. }))
        ));
    }
}
