//! Batch Interface
//!
//! Replays an exported call dataset through the billing engine and reports
//! per-customer monthly statements.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_batch::{config::BatchConfig, dataset::Dataset, replay};
//!
//! let config = BatchConfig::from_env()?;
//! let dataset = Dataset::from_path(&config.dataset_path)?;
//! let report = replay::run(&config, &dataset)?;
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod replay;

pub use config::BatchConfig;
pub use dataset::Dataset;
pub use error::BatchError;
pub use replay::{run, BatchReport};
