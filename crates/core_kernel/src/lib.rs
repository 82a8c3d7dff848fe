//! Core Kernel - Foundational types shared by the billing crates
//!
//! - Money types with precise decimal arithmetic
//! - Billing periods and commitment terms
//! - Strongly-typed identifiers

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{BillingPeriod, CommitmentTerm, TemporalError};
pub use identifiers::{CustomerId, LineId, CallId, BillId};
pub use error::CoreError;
