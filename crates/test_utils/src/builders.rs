//! Test Data Builders
//!
//! `CallBuilder` produces valid calls with sensible defaults so tests only
//! spell out what matters to them.

use chrono::{DateTime, Utc};
use core_kernel::BillingPeriod;
use domain_billing::{Call, CallDetails, CallDirection, GeoPoint};

use crate::fixtures::{NumberFixtures, TemporalFixtures};

/// Builder for call records
#[derive(Debug, Clone)]
pub struct CallBuilder {
    details: CallDetails,
}

impl Default for CallBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CallBuilder {
    /// An outgoing one-minute call from the MTM line to the term line in January 2018
    pub fn new() -> Self {
        Self {
            details: CallDetails {
                source_number: NumberFixtures::MTM.to_string(),
                destination_number: NumberFixtures::TERM.to_string(),
                timestamp: TemporalFixtures::in_period(TemporalFixtures::january(), 3600),
                duration_seconds: 60,
                source_location: GeoPoint::new(-79.428, 43.641),
                destination_location: GeoPoint::new(-79.527, 43.750),
                direction: CallDirection::Outgoing,
            },
        }
    }

    pub fn from_number(mut self, number: &str) -> Self {
        self.details.source_number = number.to_string();
        self
    }

    pub fn to_number(mut self, number: &str) -> Self {
        self.details.destination_number = number.to_string();
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.details.timestamp = timestamp;
        self
    }

    /// Places the call `offset_seconds` into `period`
    pub fn in_period(mut self, period: BillingPeriod, offset_seconds: u32) -> Self {
        self.details.timestamp = TemporalFixtures::in_period(period, offset_seconds);
        self
    }

    pub fn seconds(mut self, seconds: i64) -> Self {
        self.details.duration_seconds = seconds;
        self
    }

    pub fn minutes(self, minutes: i64) -> Self {
        self.seconds(minutes * 60)
    }

    pub fn incoming(mut self) -> Self {
        self.details.direction = CallDirection::Incoming;
        self
    }

    /// Raw details, for tests that exercise validation
    pub fn details(self) -> CallDetails {
        self.details
    }

    pub fn build(self) -> Call {
        Call::new(self.details).expect("CallBuilder produced an invalid call")
    }
}
