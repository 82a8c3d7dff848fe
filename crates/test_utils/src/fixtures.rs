//! Pre-built Test Fixtures
//!
//! The values mirror the carrier's sample dataset: customer 5555 with one
//! line per contract type, contracts starting 2017-12-25 and the term ending
//! 2019-06-25.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{BillingPeriod, CommitmentTerm, Currency, Money};
use domain_billing::{Contract, MonthToMonth, Prepaid, RateCard};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Money helpers
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn cad(amount: Decimal) -> Money {
        Money::new(amount, Currency::CAD)
    }

    pub fn cad_zero() -> Money {
        Money::zero(Currency::CAD)
    }
}

/// Periods and timestamps
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// December 2017, the month the sample contracts start
    pub fn first_period() -> BillingPeriod {
        BillingPeriod::new(2017, 12).expect("valid period")
    }

    /// January 2018
    pub fn january() -> BillingPeriod {
        BillingPeriod::new(2018, 1).expect("valid period")
    }

    pub fn contract_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 12, 25).expect("valid date")
    }

    pub fn term_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 6, 25).expect("valid date")
    }

    pub fn commitment() -> CommitmentTerm {
        CommitmentTerm::new(Self::contract_start(), Self::term_end()).expect("valid term")
    }

    /// A timestamp inside `period`, `offset_seconds` after the first of the month
    pub fn in_period(period: BillingPeriod, offset_seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(period.year(), period.month(), 1, 0, 0, 0)
            .single()
            .expect("valid timestamp")
            + chrono::Duration::seconds(offset_seconds as i64)
    }
}

/// Sample phone numbers
pub struct NumberFixtures;

impl NumberFixtures {
    pub const TERM: &'static str = "867-5309";
    pub const MTM: &'static str = "273-8255";
    pub const PREPAID: &'static str = "649-2568";
    pub const OUTSIDE: &'static str = "555-0100";
}

/// Contracts used across tests
pub struct ContractFixtures;

impl ContractFixtures {
    /// Month-to-month: fee 20.00, 100 free minutes, 0.05 per minute
    pub fn mtm_with_free_minutes() -> Contract {
        Contract::MonthToMonth(
            MonthToMonth::new(MoneyFixtures::cad(dec!(20)), MoneyFixtures::cad(dec!(0.05)))
                .with_free_minutes(100),
        )
    }

    /// Prepaid: balance 10.00, 0.10 per minute, no top-up
    pub fn prepaid_without_top_up() -> Contract {
        Contract::Prepaid(Prepaid::new(
            MoneyFixtures::cad(dec!(0.10)),
            MoneyFixtures::cad(dec!(10)),
        ))
    }

    pub fn published_mtm() -> Contract {
        Contract::month_to_month(&RateCard::default())
    }

    pub fn published_term() -> Contract {
        Contract::term(&RateCard::default(), TemporalFixtures::commitment())
    }

    /// Published prepaid tariff with 100.00 of credit
    pub fn published_prepaid() -> Contract {
        Contract::prepaid(&RateCard::default(), dec!(100))
    }
}
