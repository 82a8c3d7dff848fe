//! Batch error handling

use thiserror::Error;

use core_kernel::TemporalError;
use domain_billing::BillingError;

/// Errors that stop a batch run
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Dataset has no events and no first period is configured")]
    NoStartingPeriod,

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),
}

impl BatchError {
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}
