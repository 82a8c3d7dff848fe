//! Billing batch binary
//!
//! Replays the configured dataset and prints the customer statements as JSON
//! on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! BILLING__DATASET_PATH=dataset.json cargo run --bin billing-batch
//! ```
//!
//! # Environment Variables
//!
//! * `BILLING__DATASET_PATH` - Dataset to replay (default: dataset.json)
//! * `BILLING__FIRST_PERIOD` - First month to open, `YYYY-MM`
//! * `BILLING__LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `BILLING__LOG_JSON` - `true` for JSON log lines
//! * `BILLING__RATES__*` - Rate card overrides

use anyhow::Context;
use interface_batch::{config::BatchConfig, dataset::Dataset, replay};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = BatchConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        dataset = %config.dataset_path.display(),
        first_period = %config.starting_period(),
        "Starting billing batch"
    );

    let dataset = Dataset::from_path(&config.dataset_path)?;
    let report = replay::run(&config, &dataset)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
