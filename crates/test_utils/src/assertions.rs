//! Custom Test Assertions

use core_kernel::Money;
use domain_billing::{BillSummary, ChargeRule};
use rust_decimal::Decimal;

/// Asserts that a Money value has the expected amount
pub fn assert_money_eq(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Expected {} {}, got {}",
        actual.currency().symbol(),
        expected,
        actual
    );
}

/// Asserts that the breakdown of a bill sums to its total
pub fn assert_breakdown_balanced(summary: &BillSummary) {
    let sum: Decimal = summary.breakdown.iter().map(|line| line.amount.amount()).sum();
    assert_eq!(
        sum,
        summary.total_cost.amount(),
        "Breakdown sums to {} but total is {}",
        sum,
        summary.total_cost
    );
}

/// Asserts the bill contains only fixed charges
pub fn assert_fixed_only(summary: &BillSummary) {
    assert_eq!(summary.billed_minutes_used, 0, "Expected no billed minutes");
    assert!(
        summary.total_for(ChargeRule::Usage).is_zero(),
        "Expected no usage charges, got {}",
        summary.total_for(ChargeRule::Usage)
    );
    assert_eq!(summary.total_cost, summary.fixed_cost);
}

/// Asserts free-minute consumption stayed inside the allotment
pub fn assert_within_allotment(summary: &BillSummary) {
    assert!(
        summary.free_minutes_used <= summary.free_minutes_allotted,
        "Used {} free minutes of {}",
        summary.free_minutes_used,
        summary.free_minutes_allotted
    );
}
