//! Billing engine
//!
//! The engine owns every line in an arena and addresses them by `LineId`.
//! A billing cycle closes the current month on each active line in
//! registration order. Problems on one line never abort the batch: lines
//! whose prepaid usage was not covered come back as `Partial` summaries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument, warn};

use core_kernel::{BillingPeriod, Currency, CustomerId, LineId, Money};

use crate::call::Call;
use crate::contract::{Contract, ContractKind};
use crate::error::BillingError;
use crate::line::PhoneLine;
use crate::summary::BillSummary;

/// A registered customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// External account reference (e.g. the carrier's customer number)
    pub reference: String,
    pub lines: Vec<LineId>,
}

/// One line's bill within a customer statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStatement {
    pub line_id: LineId,
    pub number: String,
    pub contract: ContractKind,
    pub summary: BillSummary,
}

/// All bills of one customer for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStatement {
    pub customer_id: CustomerId,
    pub reference: String,
    pub period: BillingPeriod,
    pub total: Money,
    pub lines: Vec<LineStatement>,
}

/// Owner of all lines and the current billing period
#[derive(Debug)]
pub struct BillingEngine {
    currency: Currency,
    period: BillingPeriod,
    lines: Vec<PhoneLine>,
    index: HashMap<LineId, usize>,
    numbers: HashMap<String, LineId>,
    customers: BTreeMap<CustomerId, Customer>,
}

impl BillingEngine {
    /// Creates an engine whose first open month is `period`
    pub fn new(period: BillingPeriod, currency: Currency) -> Self {
        Self {
            currency,
            period,
            lines: Vec::new(),
            index: HashMap::new(),
            numbers: HashMap::new(),
            customers: BTreeMap::new(),
        }
    }

    /// The month calls currently accrue to
    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn register_customer(&mut self, reference: impl Into<String>) -> CustomerId {
        let customer = Customer {
            id: CustomerId::new_v7(),
            reference: reference.into(),
            lines: Vec::new(),
        };
        let id = customer.id;
        self.customers.insert(id, customer);
        id
    }

    pub fn customer(&self, id: &CustomerId) -> Option<&Customer> {
        self.customers.get(id)
    }

    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.values()
    }

    /// Registers a new line for a customer in the current period
    ///
    /// # Errors
    ///
    /// `CustomerNotFound`, `DuplicateNumber`, or `InvalidContract` when the
    /// contract is invalid or bills in another currency than the engine.
    #[instrument(skip(self, contract), fields(contract = %contract.kind()))]
    pub fn register_line(
        &mut self,
        customer_id: CustomerId,
        number: &str,
        contract: Contract,
    ) -> Result<LineId, BillingError> {
        if !self.customers.contains_key(&customer_id) {
            return Err(BillingError::CustomerNotFound(customer_id.to_string()));
        }
        if contract.currency() != self.currency {
            return Err(BillingError::invalid_contract(format!(
                "contract bills in {} but the engine bills in {}",
                contract.currency(),
                self.currency
            )));
        }

        let line = PhoneLine::new(customer_id, number, contract, self.period)?;
        if self.numbers.contains_key(line.number()) {
            return Err(BillingError::DuplicateNumber(line.number().to_string()));
        }

        let line_id = line.id();
        self.numbers.insert(line.number().to_string(), line_id);
        self.index.insert(line_id, self.lines.len());
        self.lines.push(line);
        if let Some(customer) = self.customers.get_mut(&customer_id) {
            customer.lines.push(line_id);
        }

        info!(line = %line_id, "Line registered");
        Ok(line_id)
    }

    pub fn line(&self, id: &LineId) -> Option<&PhoneLine> {
        self.index.get(id).map(|&i| &self.lines[i])
    }

    /// Active line currently holding `number`
    pub fn line_by_number(&self, number: &str) -> Option<&PhoneLine> {
        self.numbers.get(number).and_then(|id| self.line(id))
    }

    /// All lines, in registration order, including cancelled ones
    pub fn lines(&self) -> impl Iterator<Item = &PhoneLine> {
        self.lines.iter()
    }

    /// Logs a call on one line, dispatching on the call's direction
    ///
    /// # Errors
    ///
    /// `LineNotFound`, plus everything [`PhoneLine::make_call`] and
    /// [`PhoneLine::receive_call`] return.
    pub fn log_call(&mut self, line_id: LineId, call: Call) -> Result<(), BillingError> {
        let line = self.line_mut(&line_id)?;
        let result = if call.is_outgoing() {
            line.make_call(call)
        } else {
            line.receive_call(call)
        };
        result.map(|_| ())
    }

    /// Logs a call on both ends: outgoing on the source line and incoming on
    /// the destination line, for whichever of the two are registered
    ///
    /// The destination is logged even when the source reports an error; the
    /// source error is returned first.
    ///
    /// # Errors
    ///
    /// `LineNotFound` if neither number is registered, otherwise the first
    /// error raised by either side.
    pub fn route_call(&mut self, call: Call) -> Result<(), BillingError> {
        let source = self.numbers.get(call.source_number()).copied();
        let destination = self.numbers.get(call.destination_number()).copied();

        if source.is_none() && destination.is_none() {
            return Err(BillingError::LineNotFound(format!(
                "{} -> {}",
                call.source_number(),
                call.destination_number()
            )));
        }

        let incoming = call.as_incoming();
        let outgoing_result = match source {
            Some(id) => self.log_call(id, call),
            None => Ok(()),
        };
        let incoming_result = match destination {
            Some(id) => self.log_call(id, incoming),
            None => Ok(()),
        };
        outgoing_result.and(incoming_result)
    }

    /// Credits a prepaid line
    pub fn top_up(&mut self, line_id: LineId, amount: Money) -> Result<Money, BillingError> {
        self.line_mut(&line_id)?.top_up(amount)
    }

    /// Closes the current month on every active line and opens the next one
    ///
    /// Cancelled lines are skipped. Returns each active line's bill.
    #[instrument(skip(self), fields(period = %self.period))]
    pub fn run_billing_cycle(&mut self) -> BTreeMap<LineId, BillSummary> {
        let mut summaries = BTreeMap::new();
        let mut partial = 0usize;

        for line in self.lines.iter_mut().filter(|l| l.is_active()) {
            match line.start_new_month() {
                Ok(summary) => {
                    if summary.is_partial() {
                        partial += 1;
                        warn!(
                            line = %line.id(),
                            shortfall = %summary.shortfall(),
                            "Bill is partial: prepaid usage not covered"
                        );
                    }
                    summaries.insert(line.id(), summary);
                }
                Err(e) => warn!(line = %line.id(), error = %e, "Line skipped in billing cycle"),
            }
        }

        info!(lines = summaries.len(), partial, "Billing cycle complete");
        self.period = self.period.next();
        summaries
    }

    /// Cancels a line and returns its final bill
    ///
    /// The number is released for routing; the line stays in the arena so
    /// its bills remain available and a second cancel is rejected.
    pub fn cancel_line(&mut self, line_id: LineId) -> Result<BillSummary, BillingError> {
        let line = self.line_mut(&line_id)?;
        let summary = line.cancel()?;
        let number = line.number().to_string();
        self.numbers.remove(&number);

        info!(line = %line_id, total = %summary.total_cost, "Final bill issued");
        Ok(summary)
    }

    /// Totals a customer's bills for `period`
    ///
    /// Lines without a bill for that month are left out.
    pub fn customer_statement(
        &self,
        customer_id: &CustomerId,
        period: BillingPeriod,
    ) -> Result<CustomerStatement, BillingError> {
        let customer = self
            .customers
            .get(customer_id)
            .ok_or_else(|| BillingError::CustomerNotFound(customer_id.to_string()))?;

        let mut total = Money::zero(self.currency);
        let mut lines = Vec::new();
        for line in customer.lines.iter().filter_map(|id| self.line(id)) {
            if let Some(summary) = line.bill(&period) {
                total = total.checked_add(&summary.total_cost)?;
                lines.push(LineStatement {
                    line_id: line.id(),
                    number: line.number().to_string(),
                    contract: line.contract().kind(),
                    summary: summary.clone(),
                });
            }
        }

        Ok(CustomerStatement {
            customer_id: *customer_id,
            reference: customer.reference.clone(),
            period,
            total,
            lines,
        })
    }

    fn line_mut(&mut self, id: &LineId) -> Result<&mut PhoneLine, BillingError> {
        let index = *self
            .index
            .get(id)
            .ok_or_else(|| BillingError::LineNotFound(id.to_string()))?;
        Ok(&mut self.lines[index])
    }
}
