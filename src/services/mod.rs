pub mod failure_writer;
pub mod normalizer;
pub mod ports;
pub mod report_service;

pub use failure_writer::FailureWriter;
pub use normalizer::normalize;
pub use ports::{ExtractionPurpose, Extractor, ReportRenderer, Scorer};
pub use report_service::ReportService;
