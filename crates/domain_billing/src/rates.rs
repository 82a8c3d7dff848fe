//! Published tariffs for each contract type
//!
//! The rate card is plain configuration: amounts are decimals in the card's
//! currency and contracts turn them into `Money` when they are created.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};

/// Month-to-month tariff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthToMonthRates {
    pub monthly_fee: Decimal,
    pub minute_rate: Decimal,
    pub free_minutes: u32,
}

impl Default for MonthToMonthRates {
    fn default() -> Self {
        Self {
            monthly_fee: dec!(50.00),
            minute_rate: dec!(0.05),
            free_minutes: 0,
        }
    }
}

/// Term tariff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRates {
    pub monthly_fee: Decimal,
    pub deposit: Decimal,
    pub free_minutes: u32,
    pub minute_rate: Decimal,
    pub early_cancellation_penalty: Decimal,
}

impl Default for TermRates {
    fn default() -> Self {
        Self {
            monthly_fee: dec!(20.00),
            deposit: dec!(300.00),
            free_minutes: 100,
            minute_rate: dec!(0.10),
            early_cancellation_penalty: dec!(50.00),
        }
    }
}

/// Prepaid tariff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaidRates {
    pub minute_rate: Decimal,
    pub free_minutes: u32,
    /// Balance below which an automatic top-up is applied; `None` disables it
    pub top_up_threshold: Option<Decimal>,
    pub top_up_amount: Decimal,
}

impl Default for PrepaidRates {
    fn default() -> Self {
        Self {
            minute_rate: dec!(0.025),
            free_minutes: 0,
            top_up_threshold: Some(dec!(10.00)),
            top_up_amount: dec!(25.00),
        }
    }
}

/// The full rate card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateCard {
    pub currency: Currency,
    pub month_to_month: MonthToMonthRates,
    pub term: TermRates,
    pub prepaid: PrepaidRates,
}

impl RateCard {
    /// Converts a decimal from the card into money in the card's currency
    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.currency)
    }
}
