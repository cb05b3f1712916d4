use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::models::Submission;

/// Where the processor pulls submissions from.
#[async_trait]
pub trait SubmissionSource: Send + Sync {
    /// Up to `limit` submissions that have not been processed yet.
    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<Submission>>;

    /// Record that a processing attempt finished for `submission`.
    async fn mark_processed(&self, submission: &Submission) -> Result<()>;
}

/// [`SubmissionSource`] backed by the `form_submissions` table.
#[derive(Debug, Clone)]
pub struct PgSubmissionSource {
    pool: PgPool,
}

impl PgSubmissionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionSource for PgSubmissionSource {
    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<Submission>> {
        fetch_unprocessed(&self.pool, limit).await
    }

    async fn mark_processed(&self, submission: &Submission) -> Result<()> {
        mark_processed(&self.pool, submission.id).await?;
        Ok(())
    }
}

pub struct NewSubmission {
    pub instance_id: String,
    pub form_id: String,
    pub form_version: Option<String>,
    pub form_binding: Option<String>,
    pub device_id: Option<String>,
    pub json: String,
    pub collected: Option<DateTime<Utc>>,
}

impl NewSubmission {
    pub fn new(
        instance_id: impl Into<String>,
        form_id: impl Into<String>,
        json: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            form_id: form_id.into(),
            form_version: None,
            form_binding: None,
            device_id: None,
            json: json.into(),
            collected: None,
        }
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.form_binding = Some(binding.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.form_version = Some(version.into());
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_collected(mut self, collected: DateTime<Utc>) -> Self {
        self.collected = Some(collected);
        self
    }
}

/// Store a submission received from a device.
#[tracing::instrument(skip(executor, req), fields(instance_id = %req.instance_id, form_id = %req.form_id))]
pub async fn insert_submission<'e, E>(executor: E, req: NewSubmission) -> Result<Submission>
where
    E: sqlx::PgExecutor<'e>,
{
    let submission = sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO form_submissions
            (instance_id, form_id, form_version, form_binding, device_id, json, collected)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&req.instance_id)
    .bind(&req.form_id)
    .bind(&req.form_version)
    .bind(&req.form_binding)
    .bind(&req.device_id)
    .bind(&req.json)
    .bind(req.collected)
    .fetch_one(executor)
    .await?;

    tracing::info!(submission_id = %submission.id, "submission stored");
    Ok(submission)
}

/// Oldest unprocessed submissions first, at most `limit`.
#[tracing::instrument(skip(executor))]
pub async fn fetch_unprocessed<'e, E>(executor: E, limit: i64) -> Result<Vec<Submission>>
where
    E: sqlx::PgExecutor<'e>,
{
    let submissions = sqlx::query_as::<_, Submission>(
        r#"
        SELECT * FROM form_submissions
        WHERE processed IS NULL
        ORDER BY submitted ASC, id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(submissions)
}

/// Mark a submission processed. Re-marking keeps the first timestamp.
#[tracing::instrument(skip(executor))]
pub async fn mark_processed<'e, E>(executor: E, id: Uuid) -> Result<Submission>
where
    E: sqlx::PgExecutor<'e>,
{
    let submission = sqlx::query_as::<_, Submission>(
        r#"
        UPDATE form_submissions
        SET processed = COALESCE(processed, now())
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(PipelineError::SubmissionNotFound(id))?;

    Ok(submission)
}

/// Get a submission by ID.
pub async fn get_submission<'e, E>(executor: E, id: Uuid) -> Result<Submission>
where
    E: sqlx::PgExecutor<'e>,
{
    let submission =
        sqlx::query_as::<_, Submission>(r#"SELECT * FROM form_submissions WHERE id = $1"#)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(PipelineError::SubmissionNotFound(id))?;

    Ok(submission)
}

/// Number of submissions still waiting for processing.
pub async fn count_unprocessed<'e, E>(executor: E) -> Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    let count: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM form_submissions WHERE processed IS NULL"#)
            .fetch_one(executor)
            .await?;

    Ok(count)
}
