//! # Executor Configuration

use crate::error::{ExecutorError, Result};

/// Configuration for a [`TaskExecutor`](crate::executor::TaskExecutor).
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Number of worker slots executing dispatched tasks in parallel. Fixed
    /// for the lifetime of the executor.
    pub worker_count: usize,
}

impl ExecutorConfig {
    pub fn new(worker_count: usize) -> Self {
        Self { worker_count }
    }

    /// Validate the configuration, rejecting a non-positive pool size.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(ExecutorError::invalid_configuration(
                "worker_count must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { worker_count: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExecutorConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let err = ExecutorConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfiguration { .. }));
    }
}
