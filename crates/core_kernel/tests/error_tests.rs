//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::money::MoneyError;
use core_kernel::temporal::TemporalError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_configuration() {
    let error = CoreError::configuration("Missing rate card");

    match error {
        CoreError::Configuration(msg) => assert_eq!(msg, "Missing rate card"),
        _ => panic!("Expected Configuration error"),
    }
}

#[test]
fn test_core_error_from_money_error() {
    let money_error = MoneyError::CurrencyMismatch("CAD".to_string(), "USD".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
}

#[test]
fn test_core_error_from_temporal_error() {
    let temporal_error = TemporalError::InvalidPeriod("2018-13".to_string());
    let core_error: CoreError = temporal_error.into();

    assert!(matches!(core_error, CoreError::Temporal(_)));
    assert!(core_error.to_string().contains("2018-13"));
}
