use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A form submission as received from a collecting device.
///
/// `json` is the opaque payload; `processed` is null until the processor
/// has attempted the submission.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub instance_id: String,
    pub form_id: String,
    pub form_version: Option<String>,
    pub form_binding: Option<String>,
    pub device_id: Option<String>,
    pub json: String,
    pub collected: Option<DateTime<Utc>>,
    pub submitted: DateTime<Utc>,
    pub processed: Option<DateTime<Utc>>,
}

impl Submission {
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }
}

/// Outcome of one submission's processing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ItemOutcome {
    /// Mapped, deserialized and accepted by its handler.
    Dispatched { binding: String },
    /// No binding matched; nothing was dispatched.
    Skipped { binding: Option<String> },
    /// Some step failed; the submission is not retried.
    Failed { reason: String },
}

impl ItemOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Counts reported for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub attempted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dispatched: usize,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.attempted += 1;
        match outcome {
            ItemOutcome::Dispatched { .. } => self.dispatched += 1,
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}
