//! Monthly usage counters
//!
//! A `UsageMeter` holds everything that accrues during one billing period:
//! free and billed minutes, the fixed charges opened with the month, and the
//! prepaid balance ledger. Contracts open a meter at the start of a month and
//! rate calls into it; the meter never goes backwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillingPeriod, CallId, Currency, Money};
use crate::summary::{BalanceStatement, ChargeLine};

/// How a call's minutes were attributed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinuteSplit {
    pub free: u32,
    pub billed: u32,
}

/// Outcome of rating one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCharge {
    pub call_id: CallId,
    pub minutes: MinuteSplit,
    pub cost: Money,
    /// Part of `cost` a prepaid balance could not cover
    pub shortfall: Money,
}

impl CallCharge {
    pub fn is_unbillable(&self) -> bool {
        self.shortfall.is_positive()
    }
}

/// Automatic prepaid top-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUpPolicy {
    /// Top up when the balance is below this amount
    pub threshold: Money,
    /// Credit added per top-up
    pub amount: Money,
}

/// Prepaid balance movements within one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidLedger {
    opening: Money,
    top_ups: Money,
    drawn: Money,
    balance: Money,
    shortfall: Money,
}

impl PrepaidLedger {
    pub fn open(balance: Money) -> Self {
        let zero = Money::zero(balance.currency());
        Self {
            opening: balance,
            top_ups: zero,
            drawn: zero,
            balance,
            shortfall: zero,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn shortfall(&self) -> Money {
        self.shortfall
    }

    /// Credits the balance
    pub fn credit(&mut self, amount: Money) {
        self.top_ups = self.top_ups + amount;
        self.balance = self.balance + amount;
    }

    /// Applies the policy once if the balance sits below its threshold
    pub fn top_up_below_threshold(&mut self, policy: &TopUpPolicy) {
        if self.balance < policy.threshold && policy.amount.is_positive() {
            self.credit(policy.amount);
        }
    }

    /// Draws `cost` from the balance, topping up first when a policy allows
    ///
    /// Returns the part of `cost` that could not be covered. The balance is
    /// clamped at zero.
    pub fn draw(&mut self, cost: Money, policy: Option<&TopUpPolicy>) -> Money {
        if cost > self.balance {
            if let Some(policy) = policy.filter(|p| p.amount.is_positive()) {
                let deficit = cost - self.balance;
                let count = (deficit.amount() / policy.amount.amount()).ceil();
                self.credit(policy.amount * count);
            }
        }

        if cost <= self.balance {
            self.balance = self.balance - cost;
            self.drawn = self.drawn + cost;
            return Money::zero(cost.currency());
        }

        let uncovered = cost - self.balance;
        self.drawn = self.drawn + self.balance;
        self.balance = Money::zero(cost.currency());
        self.shortfall = self.shortfall + uncovered;
        uncovered
    }

    pub fn statement(&self) -> BalanceStatement {
        BalanceStatement {
            opening: self.opening,
            top_ups: self.top_ups,
            drawn: self.drawn,
            closing: self.balance,
            shortfall: self.shortfall,
        }
    }
}

/// Counters for one line and one billing period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMeter {
    period: BillingPeriod,
    currency: Currency,
    free_allotment: u32,
    free_minutes_used: u32,
    billed_minutes: u32,
    fixed_charges: Vec<ChargeLine>,
    prepaid: Option<PrepaidLedger>,
    unbillable_calls: Vec<CallId>,
}

impl UsageMeter {
    pub fn new(period: BillingPeriod, currency: Currency, free_allotment: u32) -> Self {
        Self {
            period,
            currency,
            free_allotment,
            free_minutes_used: 0,
            billed_minutes: 0,
            fixed_charges: Vec::new(),
            prepaid: None,
            unbillable_calls: Vec::new(),
        }
    }

    /// Adds a charge that applies to the month regardless of usage
    pub fn with_fixed_charge(mut self, line: ChargeLine) -> Self {
        self.fixed_charges.push(line);
        self
    }

    pub fn with_prepaid(mut self, ledger: PrepaidLedger) -> Self {
        self.prepaid = Some(ledger);
        self
    }

    /// Attributes minutes to the remaining free allotment first
    ///
    /// A call straddling the boundary is split: the minutes that fit are
    /// free and the rest are billed. The billed counter saturates at
    /// `u32::MAX`.
    pub fn consume(&mut self, minutes: u32) -> MinuteSplit {
        let free = minutes.min(self.free_remaining());
        let billed = minutes - free;
        self.free_minutes_used += free;
        self.billed_minutes = self.billed_minutes.saturating_add(billed);
        MinuteSplit { free, billed }
    }

    pub fn mark_unbillable(&mut self, call_id: CallId) {
        self.unbillable_calls.push(call_id);
    }

    pub fn period(&self) -> BillingPeriod {
        self.period
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn free_allotment(&self) -> u32 {
        self.free_allotment
    }

    pub fn free_minutes_used(&self) -> u32 {
        self.free_minutes_used
    }

    pub fn free_remaining(&self) -> u32 {
        self.free_allotment - self.free_minutes_used
    }

    pub fn billed_minutes(&self) -> u32 {
        self.billed_minutes
    }

    pub fn fixed_charges(&self) -> &[ChargeLine] {
        &self.fixed_charges
    }

    /// Sum of the fixed charges
    pub fn fixed_cost(&self) -> Money {
        self.fixed_charges
            .iter()
            .fold(Money::zero(self.currency), |acc, line| acc + line.amount)
    }

    pub fn prepaid(&self) -> Option<&PrepaidLedger> {
        self.prepaid.as_ref()
    }

    pub fn prepaid_mut(&mut self) -> Option<&mut PrepaidLedger> {
        self.prepaid.as_mut()
    }

    pub fn unbillable_calls(&self) -> &[CallId] {
        &self.unbillable_calls
    }

    /// Minutes beyond the free allotment as a decimal quantity
    pub fn billed_quantity(&self) -> Decimal {
        Decimal::from(self.billed_minutes)
    }
}
