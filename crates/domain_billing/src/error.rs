//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{BillingPeriod, MoneyError, TemporalError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Operation attempted on a cancelled line
    #[error("Line is cancelled: {0}")]
    LineCancelled(String),

    /// Prepaid call could not be covered by the balance; the call was still logged
    #[error("Insufficient balance on line {line}: shortfall {shortfall}")]
    InsufficientBalance {
        line: String,
        shortfall: Decimal,
    },

    /// Malformed call record, or a call that does not belong to the line
    #[error("Invalid call: {0}")]
    InvalidCall(String),

    /// Call timestamp outside the open billing period
    #[error("Call at {timestamp} is outside billing period {period}")]
    OutsideBillingPeriod {
        period: BillingPeriod,
        timestamp: String,
    },

    /// Line not found
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Phone number already registered
    #[error("Phone number already registered: {0}")]
    DuplicateNumber(String),

    /// Contract parameters are inconsistent, or the operation does not apply to it
    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Temporal error: {0}")]
    Temporal(#[from] TemporalError),
}

impl BillingError {
    pub fn invalid_call(message: impl Into<String>) -> Self {
        BillingError::InvalidCall(message.into())
    }

    pub fn invalid_contract(message: impl Into<String>) -> Self {
        BillingError::InvalidContract(message.into())
    }

    /// True for the errors that still leave the call in the line's history
    pub fn call_was_logged(&self) -> bool {
        matches!(self, BillingError::InsufficientBalance { .. })
    }
}
