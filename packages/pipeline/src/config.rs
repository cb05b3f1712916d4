use std::time::Duration;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| PipelineError::Config("DATABASE_URL not set".into()))?;

        let max_connections = env_or("DATABASE_MAX_CONNECTIONS", 5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// Settings of a single processing batch.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum number of submissions pulled per batch.
    pub batch_size: i64,
    /// Upper bound on one handler dispatch.
    pub dispatch_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 300,
            dispatch_timeout: Duration::from_secs(60),
        }
    }
}

impl ProcessorConfig {
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_dispatch_timeout(mut self, dispatch_timeout: Duration) -> Self {
        self.dispatch_timeout = dispatch_timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub processor: ProcessorConfig,
    pub interval: Duration,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        let pipeline = PipelineConfig::from_env()?;

        let batch_size: i64 = env_or("PROCESS_BATCH_SIZE", 300);
        if batch_size < 1 {
            return Err(PipelineError::Config(format!(
                "PROCESS_BATCH_SIZE must be positive, got {batch_size}"
            )));
        }

        let interval_secs: u64 = env_or("PROCESS_INTERVAL_SECS", 30);
        let dispatch_timeout_secs: u64 = env_or("DISPATCH_TIMEOUT_SECS", 60);

        Ok(Self {
            database_url: pipeline.database_url,
            max_connections: pipeline.max_connections,
            processor: ProcessorConfig {
                batch_size,
                dispatch_timeout: Duration::from_secs(dispatch_timeout_secs),
            },
            interval: Duration::from_secs(interval_secs),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
