//! Bill summaries
//!
//! A `BillSummary` is the immutable monthly statement for one line: usage
//! counters, a breakdown of every charge by the contract rule that produced
//! it, and for prepaid lines the balance movements of the month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, BillingPeriod, CallId, Currency, Money};
use crate::contract::ContractKind;

/// The contract rule a charge line comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeRule {
    /// Recurring fee of the contract
    MonthlyFee,
    /// Term deposit, charged in the first month of the term
    Deposit,
    /// Deposit returned when a term is cancelled after it was fulfilled
    DepositRefund,
    /// Minutes billed after the free allotment ran out
    Usage,
    /// Term cancelled before the end of the commitment
    EarlyCancellationPenalty,
}

/// One line of the breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub rule: ChargeRule,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub amount: Money,
}

impl ChargeLine {
    /// A single-unit charge
    pub fn new(rule: ChargeRule, description: impl Into<String>, unit_price: Money) -> Self {
        Self {
            rule,
            description: description.into(),
            quantity: Decimal::ONE,
            unit_price,
            amount: unit_price,
        }
    }

    /// Sets the quantity and recomputes the amount
    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self.amount = self.unit_price * quantity;
        self
    }
}

/// Whether every call of the month could be billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Complete,
    /// Some prepaid usage was not covered by the balance
    Partial,
}

/// Prepaid balance movements for the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceStatement {
    pub opening: Money,
    pub top_ups: Money,
    pub drawn: Money,
    pub closing: Money,
    pub shortfall: Money,
}

/// Monthly bill for one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub id: BillId,
    pub period: BillingPeriod,
    pub contract: ContractKind,
    pub fixed_cost: Money,
    pub minute_rate: Money,
    pub billed_minutes_used: u32,
    pub free_minutes_used: u32,
    pub free_minutes_allotted: u32,
    pub breakdown: Vec<ChargeLine>,
    pub total_cost: Money,
    pub balance: Option<BalanceStatement>,
    pub unbillable_calls: Vec<CallId>,
    pub status: SummaryStatus,
    /// Set on the bill produced by cancelling the line
    pub is_final: bool,
    pub generated_at: DateTime<Utc>,
}

impl BillSummary {
    pub fn currency(&self) -> Currency {
        self.total_cost.currency()
    }

    pub fn is_partial(&self) -> bool {
        self.status == SummaryStatus::Partial
    }

    /// Uncovered prepaid usage, zero for other contracts
    pub fn shortfall(&self) -> Money {
        self.balance
            .map(|b| b.shortfall)
            .unwrap_or_else(|| Money::zero(self.currency()))
    }

    /// Sum of the charges produced by one rule
    pub fn total_for(&self, rule: ChargeRule) -> Money {
        self.breakdown
            .iter()
            .filter(|line| line.rule == rule)
            .fold(Money::zero(self.currency()), |acc, line| acc + line.amount)
    }
}

/// Sums a breakdown
pub(crate) fn total_of(breakdown: &[ChargeLine], currency: Currency) -> Money {
    breakdown
        .iter()
        .fold(Money::zero(currency), |acc, line| acc + line.amount)
}
