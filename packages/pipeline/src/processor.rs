//! Batch processing of raw submissions into typed forms.
//!
//! Each submission is attempted once: payload parsed, binding resolved,
//! data mapped, rendered as markup, deserialized into the handler's form
//! and dispatched. Whatever happens, the submission is marked processed
//! afterwards and the batch moves on. Failures are counted, never retried.

use std::sync::Arc;

use fieldform_forms::{markup, Binding, BindingRegistry, FormData, Unmarshaller};

use crate::config::ProcessorConfig;
use crate::error::{PipelineError, Result};
use crate::handler::HandlerSet;
use crate::models::{BatchSummary, ItemOutcome, Submission};
use crate::submissions::SubmissionSource;

pub struct SubmissionProcessor<S> {
    source: S,
    registry: Arc<BindingRegistry>,
    unmarshaller: Unmarshaller,
    handlers: HandlerSet,
    config: ProcessorConfig,
}

impl<S: SubmissionSource> SubmissionProcessor<S> {
    pub fn new(
        source: S,
        registry: Arc<BindingRegistry>,
        unmarshaller: Unmarshaller,
        handlers: HandlerSet,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            source,
            registry,
            unmarshaller,
            handlers,
            config,
        }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Process up to `max_size` unprocessed submissions. Sizes below 1 are
    /// treated as 1.
    ///
    /// Only a failure to fetch the batch is returned as an error. Per-item
    /// failures, including failing to mark an item processed, are logged
    /// and counted in the summary.
    pub async fn run_batch(&self, max_size: i64) -> Result<BatchSummary> {
        let submissions = self.source.fetch_unprocessed(max_size.max(1)).await?;
        let mut summary = BatchSummary::default();

        for submission in &submissions {
            let outcome = self.process_submission(submission).await;

            let outcome = match self.source.mark_processed(submission).await {
                Ok(()) => outcome,
                Err(e) => {
                    tracing::error!(
                        submission_id = %submission.id,
                        error = %e,
                        "failed to mark submission processed"
                    );
                    match outcome {
                        failed @ ItemOutcome::Failed { .. } => failed,
                        _ => ItemOutcome::Failed {
                            reason: format!("failed to mark processed: {e}"),
                        },
                    }
                }
            };

            summary.record(&outcome);
        }

        tracing::info!(
            attempted = summary.attempted,
            failed = summary.failed,
            skipped = summary.skipped,
            "processing completed with {} failures",
            summary.failed
        );
        Ok(summary)
    }

    /// Attempt a single submission. Never fails; errors become
    /// [`ItemOutcome::Failed`].
    pub async fn process_submission(&self, submission: &Submission) -> ItemOutcome {
        match self.attempt(submission).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    submission_id = %submission.id,
                    instance_id = %submission.instance_id,
                    binding = submission.form_binding.as_deref().unwrap_or("-"),
                    error = %e,
                    "submission processing failed"
                );
                ItemOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn attempt(&self, submission: &Submission) -> Result<ItemOutcome> {
        let payload: serde_json::Value = serde_json::from_str(&submission.json)?;
        let data = FormData::from_payload(&payload)?;

        let Some(name) = submission.form_binding.as_deref() else {
            tracing::debug!(submission_id = %submission.id, "submission has no binding");
            return Ok(ItemOutcome::Skipped { binding: None });
        };
        let Some(binding) = self.registry.resolve(name) else {
            tracing::debug!(submission_id = %submission.id, binding = name, "no binding registered");
            return Ok(ItemOutcome::Skipped {
                binding: Some(name.to_string()),
            });
        };

        tracing::info!(
            instance_id = data.instance_id().unwrap_or(&submission.instance_id),
            binding = name,
            "processing form"
        );
        self.dispatch(binding, &data).await?;

        Ok(ItemOutcome::Dispatched {
            binding: name.to_string(),
        })
    }

    async fn dispatch(&self, binding: &Binding, data: &FormData) -> Result<()> {
        let structure = binding.map(data)?;
        let xml = markup::serialize(&structure);
        let form = self.unmarshaller.unmarshal(binding.kind(), &xml)?;

        let handler = self
            .handlers
            .get(binding.kind())
            .cloned()
            .ok_or(PipelineError::NoHandler(binding.kind()))?;

        // Run on its own task so a panicking handler only fails this item
        // and a timed-out one can be aborted.
        let mut task = tokio::spawn(async move { handler.process_form(&form).await });
        let timeout = self.config.dispatch_timeout;
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(result)) => result.map_err(PipelineError::Handler),
            Ok(Err(join_err)) => Err(PipelineError::Handler(Box::new(join_err))),
            Err(_) => {
                task.abort();
                Err(PipelineError::DispatchTimeout(timeout))
            }
        }
    }
}
