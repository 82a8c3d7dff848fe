//! Property-Based Test Generators
//!
//! Proptest strategies for call durations and chronological call sequences
//! inside a single billing period.

use core_kernel::BillingPeriod;
use domain_billing::Call;
use proptest::prelude::*;

use crate::builders::CallBuilder;
use crate::fixtures::NumberFixtures;

/// Call durations from zero to two hours, in seconds
pub fn duration_seconds_strategy() -> impl Strategy<Value = i64> {
    0i64..7_200i64
}

/// Between zero and `max_calls` durations
pub fn durations_strategy(max_calls: usize) -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(duration_seconds_strategy(), 0..max_calls)
}

/// Outgoing calls from `number` spread over the first days of `period`
pub fn outgoing_calls(number: &str, period: BillingPeriod, durations: &[i64]) -> Vec<Call> {
    durations
        .iter()
        .enumerate()
        .map(|(i, &seconds)| {
            CallBuilder::new()
                .from_number(number)
                .to_number(NumberFixtures::OUTSIDE)
                .in_period(period, (i as u32) * 600)
                .seconds(seconds)
                .build()
        })
        .collect()
}
