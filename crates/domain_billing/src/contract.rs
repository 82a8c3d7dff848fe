//! Contract strategies
//!
//! Every line is governed by one of three contracts. `Contract` is a closed
//! enum; each variant struct knows how to open a month, which free allotment
//! and fixed charges apply, and which extra charges a cancellation adds.
//!
//! | Contract       | Fixed charges                       | Minutes                        | Cancellation               |
//! |----------------|-------------------------------------|--------------------------------|----------------------------|
//! | Month-to-month | monthly fee                         | free allotment, then per-minute| nothing                    |
//! | Prepaid        | none                                | drawn from balance per call    | remaining credit forfeited |
//! | Term           | monthly fee, deposit in first month | free + added free, then billed | penalty or deposit refund  |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use core_kernel::{BillId, BillingPeriod, CommitmentTerm, Currency, Money};

use crate::call::Call;
use crate::error::BillingError;
use crate::rates::RateCard;
use crate::summary::{total_of, BillSummary, ChargeLine, ChargeRule, SummaryStatus};
use crate::usage::{CallCharge, PrepaidLedger, TopUpPolicy, UsageMeter};

/// Contract type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    MonthToMonth,
    Prepaid,
    Term,
}

impl ContractKind {
    pub fn code(&self) -> &'static str {
        match self {
            ContractKind::MonthToMonth => "MTM",
            ContractKind::Prepaid => "PREPAID",
            ContractKind::Term => "TERM",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ContractKind {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtm" | "month_to_month" => Ok(ContractKind::MonthToMonth),
            "prepaid" => Ok(ContractKind::Prepaid),
            "term" => Ok(ContractKind::Term),
            other => Err(BillingError::invalid_contract(format!("unknown contract type '{other}'"))),
        }
    }
}

/// When a summary is being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Regular close of the month
    MonthEnd,
    /// Final bill of a cancelled line
    Cancellation,
}

/// No commitment; higher per-minute rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthToMonth {
    pub fixed_rate: Money,
    pub minute_rate: Money,
    pub free_minutes: u32,
}

impl MonthToMonth {
    pub fn new(fixed_rate: Money, minute_rate: Money) -> Self {
        Self {
            fixed_rate,
            minute_rate,
            free_minutes: 0,
        }
    }

    pub fn with_free_minutes(mut self, minutes: u32) -> Self {
        self.free_minutes = minutes;
        self
    }

    fn open_meter(&self, period: BillingPeriod) -> UsageMeter {
        UsageMeter::new(period, self.fixed_rate.currency(), self.free_minutes)
            .with_fixed_charge(ChargeLine::new(
                ChargeRule::MonthlyFee,
                "Month-to-month fee",
                self.fixed_rate,
            ))
    }
}

/// Pay-as-you-go against a pre-loaded balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepaid {
    pub minute_rate: Money,
    pub free_minutes: u32,
    pub top_up: Option<TopUpPolicy>,
    balance: Money,
}

impl Prepaid {
    pub fn new(minute_rate: Money, balance: Money) -> Self {
        Self {
            minute_rate,
            free_minutes: 0,
            top_up: None,
            balance,
        }
    }

    pub fn with_free_minutes(mut self, minutes: u32) -> Self {
        self.free_minutes = minutes;
        self
    }

    pub fn with_top_up(mut self, policy: TopUpPolicy) -> Self {
        self.top_up = Some(policy);
        self
    }

    /// Balance carried into the next month to be opened
    pub fn balance(&self) -> Money {
        self.balance
    }

    fn open_meter(&self, period: BillingPeriod) -> UsageMeter {
        let mut ledger = PrepaidLedger::open(self.balance);
        if let Some(policy) = &self.top_up {
            ledger.top_up_below_threshold(policy);
        }
        UsageMeter::new(period, self.minute_rate.currency(), self.free_minutes).with_prepaid(ledger)
    }
}

/// Fixed commitment with a deposit and included minutes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term: CommitmentTerm,
    pub monthly_fee: Money,
    pub deposit: Money,
    pub free_minutes: u32,
    /// Promotional minutes on top of the base allotment
    pub added_free_minutes: u32,
    pub minute_rate: Money,
    pub early_cancellation_penalty: Money,
    /// Set once a month that charged the deposit has been closed
    #[serde(default)]
    deposit_paid: bool,
}

impl Term {
    pub fn new(term: CommitmentTerm, monthly_fee: Money, minute_rate: Money) -> Self {
        let zero = Money::zero(monthly_fee.currency());
        Self {
            term,
            monthly_fee,
            deposit: zero,
            free_minutes: 0,
            added_free_minutes: 0,
            minute_rate,
            early_cancellation_penalty: zero,
            deposit_paid: false,
        }
    }

    pub fn with_deposit(mut self, deposit: Money) -> Self {
        self.deposit = deposit;
        self
    }

    pub fn with_free_minutes(mut self, minutes: u32) -> Self {
        self.free_minutes = minutes;
        self
    }

    pub fn with_added_free_minutes(mut self, minutes: u32) -> Self {
        self.added_free_minutes = minutes;
        self
    }

    pub fn with_early_cancellation_penalty(mut self, penalty: Money) -> Self {
        self.early_cancellation_penalty = penalty;
        self
    }

    /// Whether the deposit has been collected and is owed back on completion
    pub fn deposit_paid(&self) -> bool {
        self.deposit_paid
    }

    fn open_meter(&self, period: BillingPeriod) -> UsageMeter {
        let allotment = self.free_minutes.saturating_add(self.added_free_minutes);
        let mut meter = UsageMeter::new(period, self.monthly_fee.currency(), allotment)
            .with_fixed_charge(ChargeLine::new(ChargeRule::MonthlyFee, "Term fee", self.monthly_fee));
        if period == self.term.start_period() && !self.deposit.is_zero() {
            meter = meter.with_fixed_charge(ChargeLine::new(ChargeRule::Deposit, "Term deposit", self.deposit));
        }
        meter
    }

    /// `deposit_collected` covers a deposit charged in the month being closed
    fn cancellation_charges(&self, period: BillingPeriod, deposit_collected: bool) -> Vec<ChargeLine> {
        if self.term.is_fulfilled_by(&period) {
            if self.deposit.is_zero() || !deposit_collected {
                return Vec::new();
            }
            return vec![ChargeLine::new(
                ChargeRule::DepositRefund,
                "Deposit returned at end of term",
                -self.deposit,
            )];
        }
        vec![ChargeLine::new(
            ChargeRule::EarlyCancellationPenalty,
            format!("Cancelled before {}", self.term.end),
            self.early_cancellation_penalty,
        )]
    }
}

/// A line's contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contract {
    MonthToMonth(MonthToMonth),
    Prepaid(Prepaid),
    Term(Term),
}

impl Contract {
    /// Month-to-month contract on the published tariff
    pub fn month_to_month(rates: &RateCard) -> Self {
        let tariff = &rates.month_to_month;
        Contract::MonthToMonth(
            MonthToMonth::new(rates.money(tariff.monthly_fee), rates.money(tariff.minute_rate))
                .with_free_minutes(tariff.free_minutes),
        )
    }

    /// Prepaid contract on the published tariff with an opening balance
    pub fn prepaid(rates: &RateCard, balance: Decimal) -> Self {
        let tariff = &rates.prepaid;
        let mut prepaid = Prepaid::new(rates.money(tariff.minute_rate), rates.money(balance))
            .with_free_minutes(tariff.free_minutes);
        if let Some(threshold) = tariff.top_up_threshold {
            prepaid = prepaid.with_top_up(TopUpPolicy {
                threshold: rates.money(threshold),
                amount: rates.money(tariff.top_up_amount),
            });
        }
        Contract::Prepaid(prepaid)
    }

    /// Term contract on the published tariff
    pub fn term(rates: &RateCard, term: CommitmentTerm) -> Self {
        let tariff = &rates.term;
        Contract::Term(
            Term::new(term, rates.money(tariff.monthly_fee), rates.money(tariff.minute_rate))
                .with_deposit(rates.money(tariff.deposit))
                .with_free_minutes(tariff.free_minutes)
                .with_early_cancellation_penalty(rates.money(tariff.early_cancellation_penalty)),
        )
    }

    /// Builds the contract of the given kind from the rate card
    pub fn from_rates(
        kind: ContractKind,
        rates: &RateCard,
        term: CommitmentTerm,
        prepaid_balance: Decimal,
    ) -> Self {
        match kind {
            ContractKind::MonthToMonth => Self::month_to_month(rates),
            ContractKind::Prepaid => Self::prepaid(rates, prepaid_balance),
            ContractKind::Term => Self::term(rates, term),
        }
    }

    pub fn kind(&self) -> ContractKind {
        match self {
            Contract::MonthToMonth(_) => ContractKind::MonthToMonth,
            Contract::Prepaid(_) => ContractKind::Prepaid,
            Contract::Term(_) => ContractKind::Term,
        }
    }

    pub fn minute_rate(&self) -> Money {
        match self {
            Contract::MonthToMonth(c) => c.minute_rate,
            Contract::Prepaid(c) => c.minute_rate,
            Contract::Term(c) => c.minute_rate,
        }
    }

    pub fn currency(&self) -> Currency {
        self.minute_rate().currency()
    }

    /// Checks that amounts are non-negative and share one currency
    pub fn validate(&self) -> Result<(), BillingError> {
        let currency = self.currency();
        let amounts: Vec<(&str, Money)> = match self {
            Contract::MonthToMonth(c) => vec![("fixed rate", c.fixed_rate), ("minute rate", c.minute_rate)],
            Contract::Prepaid(c) => {
                let mut amounts = vec![("minute rate", c.minute_rate), ("balance", c.balance)];
                if let Some(policy) = &c.top_up {
                    if !policy.amount.is_positive() {
                        return Err(BillingError::invalid_contract("top-up amount must be positive"));
                    }
                    amounts.push(("top-up threshold", policy.threshold));
                    amounts.push(("top-up amount", policy.amount));
                }
                amounts
            }
            Contract::Term(c) => vec![
                ("monthly fee", c.monthly_fee),
                ("deposit", c.deposit),
                ("minute rate", c.minute_rate),
                ("early cancellation penalty", c.early_cancellation_penalty),
            ],
        };

        for (name, amount) in amounts {
            if amount.currency() != currency {
                return Err(BillingError::invalid_contract(format!(
                    "{name} is in {} but the contract bills in {currency}",
                    amount.currency()
                )));
            }
            if amount.is_negative() {
                return Err(BillingError::invalid_contract(format!("{name} is negative")));
            }
        }
        Ok(())
    }

    /// Opens the counters for `period` at their base allotment
    pub fn open_meter(&self, period: BillingPeriod) -> UsageMeter {
        match self {
            Contract::MonthToMonth(c) => c.open_meter(period),
            Contract::Prepaid(c) => c.open_meter(period),
            Contract::Term(c) => c.open_meter(period),
        }
    }

    /// Rates one call into the meter
    ///
    /// Incoming calls are never charged. Outgoing minutes consume the free
    /// allotment first; prepaid costs are drawn from the balance straight
    /// away and any uncovered part is reported as `shortfall`.
    ///
    /// # Errors
    ///
    /// `OutsideBillingPeriod` when the call is not in the meter's month.
    pub fn rate_call(&self, meter: &mut UsageMeter, call: &Call) -> Result<CallCharge, BillingError> {
        if call.period() != meter.period() {
            return Err(BillingError::OutsideBillingPeriod {
                period: meter.period(),
                timestamp: call.timestamp().to_rfc3339(),
            });
        }

        let zero = Money::zero(meter.currency());
        if !call.is_outgoing() {
            return Ok(CallCharge {
                call_id: call.id(),
                minutes: Default::default(),
                cost: zero,
                shortfall: zero,
            });
        }

        let minutes = meter.consume(call.rated_minutes());
        let cost = self.minute_rate() * Decimal::from(minutes.billed);

        let shortfall = match (self, meter.prepaid_mut()) {
            (Contract::Prepaid(prepaid), Some(ledger)) => ledger.draw(cost, prepaid.top_up.as_ref()),
            _ => zero,
        };
        if shortfall.is_positive() {
            meter.mark_unbillable(call.id());
        }

        Ok(CallCharge {
            call_id: call.id(),
            minutes,
            cost,
            shortfall,
        })
    }

    /// Produces the bill for the meter's month
    pub fn settle(&self, meter: &UsageMeter, settlement: Settlement) -> BillSummary {
        let currency = meter.currency();
        let minute_rate = self.minute_rate();

        let mut breakdown: Vec<ChargeLine> = meter.fixed_charges().to_vec();
        if meter.billed_minutes() > 0 {
            breakdown.push(
                ChargeLine::new(
                    ChargeRule::Usage,
                    format!("{} billed minutes", meter.billed_minutes()),
                    minute_rate,
                )
                .with_quantity(meter.billed_quantity()),
            );
        }
        if let (Settlement::Cancellation, Contract::Term(term)) = (settlement, self) {
            let collected = term.deposit_paid || charges_deposit(meter);
            breakdown.extend(term.cancellation_charges(meter.period(), collected));
        }

        let balance = meter.prepaid().map(PrepaidLedger::statement);
        let status = if balance.is_some_and(|b| b.shortfall.is_positive()) {
            SummaryStatus::Partial
        } else {
            SummaryStatus::Complete
        };

        BillSummary {
            id: BillId::new_v7(),
            period: meter.period(),
            contract: self.kind(),
            fixed_cost: meter.fixed_cost(),
            minute_rate,
            billed_minutes_used: meter.billed_minutes(),
            free_minutes_used: meter.free_minutes_used(),
            free_minutes_allotted: meter.free_allotment(),
            total_cost: total_of(&breakdown, currency),
            breakdown,
            balance,
            unbillable_calls: meter.unbillable_calls().to_vec(),
            status,
            is_final: settlement == Settlement::Cancellation,
            generated_at: Utc::now(),
        }
    }

    /// Carries state out of a closed month: the prepaid closing balance and
    /// whether a term deposit was collected
    pub fn commit(&mut self, meter: &UsageMeter) {
        match self {
            Contract::Prepaid(prepaid) => {
                if let Some(ledger) = meter.prepaid() {
                    prepaid.balance = ledger.balance();
                }
            }
            Contract::Term(term) => {
                if charges_deposit(meter) {
                    term.deposit_paid = true;
                }
            }
            Contract::MonthToMonth(_) => {}
        }
    }

    /// Computes the month-end bill for `calls` without touching any state
    ///
    /// Calls are rated in chronological order regardless of the order given.
    ///
    /// # Errors
    ///
    /// `OutsideBillingPeriod` if any call is not in `period`.
    pub fn compute_cost(&self, period: BillingPeriod, calls: &[Call]) -> Result<BillSummary, BillingError> {
        let mut ordered: Vec<&Call> = calls.iter().collect();
        ordered.sort_by_key(|c| c.timestamp());

        let mut meter = self.open_meter(period);
        for call in ordered {
            self.rate_call(&mut meter, call)?;
        }
        Ok(self.settle(&meter, Settlement::MonthEnd))
    }
}

fn charges_deposit(meter: &UsageMeter) -> bool {
    meter
        .fixed_charges()
        .iter()
        .any(|line| line.rule == ChargeRule::Deposit)
}
