//! Dataset replay
//!
//! Registers every customer and line from a dataset, then feeds call events
//! to the engine in time order. Whenever an event falls in a later month the
//! open month is closed on all lines first; the last month is closed after
//! the final event. One statement per customer is produced for every closed
//! month.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use core_kernel::{BillingPeriod, CustomerId};
use domain_billing::{BillingEngine, Contract, CustomerStatement};

use crate::config::BatchConfig;
use crate::dataset::{Dataset, EventRecord};
use crate::error::BatchError;

/// Outcome of a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Months closed, in order
    pub periods: Vec<BillingPeriod>,
    /// Calls logged on at least one line
    pub calls_logged: usize,
    /// Calls logged whose prepaid cost was not covered
    pub calls_uncovered: usize,
    /// Calls no line accepted
    pub calls_rejected: usize,
    pub messages_skipped: usize,
    pub statements: Vec<CustomerStatement>,
}

/// Replays `dataset` with the rates and contract dates in `config`
///
/// # Errors
///
/// Fails on an invalid configuration or customer record. Individual call
/// events that cannot be logged are counted in the report, not returned.
#[instrument(skip_all, fields(customers = dataset.customers.len(), events = dataset.events.len()))]
pub fn run(config: &BatchConfig, dataset: &Dataset) -> Result<BatchReport, BatchError> {
    let commitment = config.commitment()?;
    let mut engine = BillingEngine::new(config.starting_period(), config.rates.currency);
    let mut customers: Vec<CustomerId> = Vec::with_capacity(dataset.customers.len());
    let mut references: HashMap<String, CustomerId> = HashMap::new();

    for record in &dataset.customers {
        let reference = record.id.to_string();
        if references.contains_key(&reference) {
            return Err(BatchError::invalid_record(format!("customer {reference} appears twice")));
        }
        let customer_id = engine.register_customer(reference.clone());
        references.insert(reference, customer_id);
        customers.push(customer_id);

        for line in &record.lines {
            let balance = line.balance.unwrap_or(config.prepaid_opening_balance);
            let contract = Contract::from_rates(line.contract_kind()?, &config.rates, commitment, balance);
            engine.register_line(customer_id, &line.number, contract)?;
        }
    }

    let mut report = BatchReport {
        periods: Vec::new(),
        calls_logged: 0,
        calls_uncovered: 0,
        calls_rejected: 0,
        messages_skipped: 0,
        statements: Vec::new(),
    };

    for event in dataset.events_in_order() {
        let record = match event {
            EventRecord::Call(record) => record,
            EventRecord::Sms(_) => {
                report.messages_skipped += 1;
                continue;
            }
        };

        let period = BillingPeriod::of(record.timestamp());
        while engine.period() < period {
            close_month(&mut engine, &customers, &mut report)?;
        }

        let call = match record.to_call() {
            Ok(call) => call,
            Err(e) => {
                warn!(src = %record.src_number, time = %record.time, error = %e, "Call record rejected");
                report.calls_rejected += 1;
                continue;
            }
        };

        match engine.route_call(call) {
            Ok(()) => report.calls_logged += 1,
            Err(e) if e.call_was_logged() => {
                report.calls_logged += 1;
                report.calls_uncovered += 1;
            }
            Err(e) => {
                warn!(src = %record.src_number, dst = %record.dst_number, error = %e, "Call not logged");
                report.calls_rejected += 1;
            }
        }
    }

    close_month(&mut engine, &customers, &mut report)?;

    info!(
        months = report.periods.len(),
        logged = report.calls_logged,
        rejected = report.calls_rejected,
        "Replay complete"
    );
    Ok(report)
}

fn close_month(
    engine: &mut BillingEngine,
    customers: &[CustomerId],
    report: &mut BatchReport,
) -> Result<(), BatchError> {
    let period = engine.period();
    let bills = engine.run_billing_cycle();
    debug!(%period, lines = bills.len(), "Month closed");

    for customer_id in customers {
        report.statements.push(engine.customer_statement(customer_id, period)?);
    }
    report.periods.push(period);
    Ok(())
}
