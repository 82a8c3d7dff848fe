//! Batch configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `billing.toml` in the working directory, then `BILLING__*` environment
//! variables (`BILLING__RATES__TERM__DEPOSIT=250`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use core_kernel::{BillingPeriod, CommitmentTerm};
use domain_billing::RateCard;

use crate::error::BatchError;

/// Batch run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Path of the JSON dataset to replay
    pub dataset_path: PathBuf,
    /// First month to open; defaults to the month contracts start
    pub first_period: Option<BillingPeriod>,
    /// Start date of every contract created by the batch
    pub contract_start: NaiveDate,
    /// End of the commitment for term contracts
    pub term_end: NaiveDate,
    /// Credit loaded on new prepaid lines
    pub prepaid_opening_balance: Decimal,
    pub rates: RateCard,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            dataset_path: PathBuf::from("dataset.json"),
            first_period: None,
            contract_start: NaiveDate::from_ymd_opt(2017, 12, 25).expect("valid default contract start"),
            term_end: NaiveDate::from_ymd_opt(2019, 6, 25).expect("valid default term end"),
            prepaid_opening_balance: dec!(100),
            rates: RateCard::default(),
        }
    }
}

impl BatchConfig {
    /// Loads configuration from `billing.toml` and the environment
    pub fn from_env() -> Result<Self, BatchError> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name("billing").required(false))
            .add_source(config::Environment::with_prefix("BILLING").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Commitment shared by term contracts
    pub fn commitment(&self) -> Result<CommitmentTerm, BatchError> {
        Ok(CommitmentTerm::new(self.contract_start, self.term_end)?)
    }

    /// The configured first month, or the month contracts start
    pub fn starting_period(&self) -> BillingPeriod {
        self.first_period
            .unwrap_or_else(|| BillingPeriod::of_date(self.contract_start))
    }
}
