//! Billing Domain - rating calls against mobile contracts
//!
//! This crate turns a month of call records into bills. Calls flow one way:
//! a [`Call`] is logged on a [`PhoneLine`], rated against the line's
//! [`Contract`] into a [`UsageMeter`], and the [`BillingEngine`] closes the
//! month on every line to produce [`BillSummary`] values.
//!
//! # Contracts
//!
//! - **Month-to-month**: monthly fee, optional free minutes, per-minute overage
//! - **Prepaid**: usage drawn from a balance as calls happen, optional auto top-up
//! - **Term**: monthly fee, deposit in the first month, included minutes,
//!   penalty when cancelled early
//!
//! # Rounding
//!
//! Each call is rated in whole minutes, rounding up per call. Amounts keep
//! four decimal places.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingEngine, Contract, RateCard};
//!
//! let rates = RateCard::default();
//! let mut engine = BillingEngine::new(period, rates.currency);
//! let customer = engine.register_customer("5555");
//! let line = engine.register_line(customer, "867-5309", Contract::month_to_month(&rates))?;
//!
//! engine.log_call(line, call)?;
//! let bills = engine.run_billing_cycle();
//! ```

pub mod call;
pub mod history;
pub mod rates;
pub mod usage;
pub mod contract;
pub mod summary;
pub mod line;
pub mod engine;
pub mod error;

pub use call::{Call, CallDetails, CallDirection, GeoPoint};
pub use history::CallHistory;
pub use rates::{RateCard, MonthToMonthRates, PrepaidRates, TermRates};
pub use usage::{CallCharge, MinuteSplit, PrepaidLedger, TopUpPolicy, UsageMeter};
pub use contract::{Contract, ContractKind, MonthToMonth, Prepaid, Settlement, Term};
pub use summary::{BalanceStatement, BillSummary, ChargeLine, ChargeRule, SummaryStatus};
pub use line::{LineState, PhoneLine};
pub use engine::{BillingEngine, Customer, CustomerStatement, LineStatement};
pub use error::BillingError;
