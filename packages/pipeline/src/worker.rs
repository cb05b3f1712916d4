use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

use fieldform_forms::{BindingRegistry, Unmarshaller};

use crate::config::WorkerConfig;
use crate::db;
use crate::error::{PipelineError, Result};
use crate::handler::HandlerSet;
use crate::processor::SubmissionProcessor;
use crate::submissions::{PgSubmissionSource, SubmissionSource};

/// Run the periodic form processing loop.
///
/// Runs one batch per interval until SIGTERM or SIGINT (ctrl+c).
/// Shutdown is checked between batches; an in-flight batch always completes.
pub async fn run_process_worker(config: WorkerConfig, handlers: HandlerSet) -> Result<()> {
    let pool = db::create_pool(&config.pipeline_config()).await?;
    db::run_migrations(&pool).await?;

    let registry = Arc::new(BindingRegistry::standard());
    tracing::info!(
        bindings = ?registry.names(),
        batch_size = config.processor.batch_size,
        interval = ?config.interval,
        "starting form processing worker"
    );

    let processor = SubmissionProcessor::new(
        PgSubmissionSource::new(pool),
        registry,
        Unmarshaller::new(),
        handlers,
        config.processor.clone(),
    );

    run_loop(&processor, &config).await
}

async fn run_loop<S: SubmissionSource>(
    processor: &SubmissionProcessor<S>,
    config: &WorkerConfig,
) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| PipelineError::Worker(format!("failed to register SIGTERM handler: {e}")))?;

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT, stopping worker");
                break;
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, stopping worker");
                break;
            }
            _ = ticker.tick() => {}
        }

        // Outside select! so a batch is never cancelled halfway.
        match processor.run_batch(config.processor.batch_size).await {
            Ok(summary) => {
                tracing::info!("processed {} forms", summary.attempted);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch submissions");
            }
        }
    }

    Ok(())
}
