//! Phone lines
//!
//! A `PhoneLine` owns its contract, the open month's call history and usage
//! meter, and the archive of bills already issued. It is either `Active` or
//! `Cancelled`; cancellation is terminal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use core_kernel::{BillingPeriod, CustomerId, LineId, Money};

use crate::call::{Call, CallDirection};
use crate::contract::{Contract, Settlement};
use crate::error::BillingError;
use crate::history::CallHistory;
use crate::summary::BillSummary;
use crate::usage::{CallCharge, UsageMeter};

/// Lifecycle state of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineState {
    Active,
    Cancelled,
}

/// A customer's phone line
#[derive(Debug, Clone)]
pub struct PhoneLine {
    id: LineId,
    customer_id: CustomerId,
    number: String,
    contract: Contract,
    state: LineState,
    history: CallHistory,
    usage: UsageMeter,
    bills: BTreeMap<BillingPeriod, BillSummary>,
}

impl PhoneLine {
    /// Opens a line with `period` as its first billing month
    ///
    /// # Errors
    ///
    /// `InvalidContract` if the contract fails validation, `InvalidCall` if
    /// the number is blank.
    pub fn new(
        customer_id: CustomerId,
        number: impl Into<String>,
        contract: Contract,
        period: BillingPeriod,
    ) -> Result<Self, BillingError> {
        let number = number.into().trim().to_string();
        if number.is_empty() {
            return Err(BillingError::invalid_call("line number is empty"));
        }
        contract.validate()?;

        let usage = contract.open_meter(period);
        Ok(Self {
            id: LineId::new_v7(),
            customer_id,
            number,
            contract,
            state: LineState::Active,
            history: CallHistory::new(),
            usage,
            bills: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LineState::Active
    }

    /// The month calls are currently accruing to
    pub fn period(&self) -> BillingPeriod {
        self.usage.period()
    }

    pub fn history(&self) -> &CallHistory {
        &self.history
    }

    pub fn usage(&self) -> &UsageMeter {
        &self.usage
    }

    /// Bill issued for `period`, if any
    pub fn bill(&self, period: &BillingPeriod) -> Option<&BillSummary> {
        self.bills.get(period)
    }

    pub fn bills(&self) -> impl Iterator<Item = &BillSummary> {
        self.bills.values()
    }

    /// Logs an outgoing call and rates it
    ///
    /// Calls are rated in the order they arrive. The history stays sorted by
    /// timestamp, but free minutes and prepaid credit go to whichever call
    /// was logged first, so a late-arriving earlier call can be the one
    /// flagged unbillable. [`Contract::compute_cost`] rates by timestamp
    /// instead; the two agree whenever calls arrive in order.
    ///
    /// # Errors
    ///
    /// - `LineCancelled` once the line is cancelled (nothing is recorded)
    /// - `InvalidCall` if the call is not outgoing from this number
    /// - `OutsideBillingPeriod` if the call is not in the open month
    /// - `InsufficientBalance` if a prepaid balance could not cover it; the
    ///   call is still recorded and flagged unbillable
    pub fn make_call(&mut self, call: Call) -> Result<CallCharge, BillingError> {
        self.ensure_active()?;
        if call.direction() != CallDirection::Outgoing || call.source_number() != self.number {
            return Err(BillingError::invalid_call(format!(
                "call {} is not an outgoing call from {}",
                call.id(),
                self.number
            )));
        }
        self.log(call)
    }

    /// Logs an incoming call; incoming calls are never charged
    ///
    /// # Errors
    ///
    /// Same as [`PhoneLine::make_call`], except `InsufficientBalance`.
    pub fn receive_call(&mut self, call: Call) -> Result<CallCharge, BillingError> {
        self.ensure_active()?;
        if call.direction() != CallDirection::Incoming || call.destination_number() != self.number {
            return Err(BillingError::invalid_call(format!(
                "call {} is not an incoming call to {}",
                call.id(),
                self.number
            )));
        }
        self.log(call)
    }

    /// Closes the open month and opens the next one
    ///
    /// The returned summary is archived under the closed month. Calling this
    /// again with no calls in between bills only the fixed charges.
    pub fn start_new_month(&mut self) -> Result<BillSummary, BillingError> {
        self.ensure_active()?;

        let summary = self.contract.settle(&self.usage, Settlement::MonthEnd);
        self.contract.commit(&self.usage);
        let closed = self.usage.period();
        self.bills.insert(closed, summary.clone());

        let released = self.history.drain();
        self.usage = self.contract.open_meter(closed.next());

        debug!(
            line = %self.id,
            period = %closed,
            calls = released.len(),
            total = %summary.total_cost,
            "Closed billing month"
        );
        Ok(summary)
    }

    /// Cancels the line and returns its final bill
    ///
    /// # Errors
    ///
    /// `LineCancelled` if the line was already cancelled.
    pub fn cancel(&mut self) -> Result<BillSummary, BillingError> {
        self.ensure_active()?;

        let summary = self.contract.settle(&self.usage, Settlement::Cancellation);
        self.contract.commit(&self.usage);
        self.bills.insert(summary.period, summary.clone());
        self.history.drain();
        self.state = LineState::Cancelled;

        debug!(line = %self.id, total = %summary.total_cost, "Line cancelled");
        Ok(summary)
    }

    /// Credits a prepaid balance, returning the new balance
    ///
    /// # Errors
    ///
    /// `InvalidContract` for non-prepaid lines or a non-positive amount,
    /// `Money` on a currency mismatch.
    pub fn top_up(&mut self, amount: Money) -> Result<Money, BillingError> {
        self.ensure_active()?;
        if !amount.is_positive() {
            return Err(BillingError::invalid_contract("top-up amount must be positive"));
        }
        amount.ensure_same_currency(&Money::zero(self.usage.currency()))?;

        let ledger = self
            .usage
            .prepaid_mut()
            .ok_or_else(|| BillingError::invalid_contract(format!(
                "line {} is not prepaid",
                self.number
            )))?;
        ledger.credit(amount);
        Ok(ledger.balance())
    }

    fn log(&mut self, call: Call) -> Result<CallCharge, BillingError> {
        let charge = self.contract.rate_call(&mut self.usage, &call)?;
        debug!(
            line = %self.id,
            call = %call.id(),
            free = charge.minutes.free,
            billed = charge.minutes.billed,
            "Call logged"
        );
        self.history.record(call);

        if charge.is_unbillable() {
            warn!(line = %self.id, shortfall = %charge.shortfall, "Prepaid balance exhausted");
            return Err(BillingError::InsufficientBalance {
                line: self.number.clone(),
                shortfall: charge.shortfall.amount(),
            });
        }
        Ok(charge)
    }

    fn ensure_active(&self) -> Result<(), BillingError> {
        if self.state == LineState::Cancelled {
            warn!(line = %self.id, number = %self.number, "Operation on cancelled line rejected");
            return Err(BillingError::LineCancelled(self.number.clone()));
        }
        Ok(())
    }
}
