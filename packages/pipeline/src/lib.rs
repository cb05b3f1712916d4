pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod handler;
pub mod models;
pub mod processor;
pub mod submissions;
pub mod worker;

pub use config::{PipelineConfig, ProcessorConfig, WorkerConfig};
pub use db::{create_pool, run_migrations};
pub use error::{HandlerError, PipelineError};
pub use export::{export_record, export_submission, ColumnValue, ExportPlan, ExportRecord};
pub use handler::{FormHandler, HandlerSet, LoggingHandler};
pub use models::{BatchSummary, ItemOutcome, Submission};
pub use processor::SubmissionProcessor;
pub use submissions::{NewSubmission, PgSubmissionSource, SubmissionSource};
