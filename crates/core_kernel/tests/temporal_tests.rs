//! Tests for billing periods and commitment terms

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{BillingPeriod, CommitmentTerm, TemporalError};

fn period(year: i32, month: u32) -> BillingPeriod {
    BillingPeriod::new(year, month).unwrap()
}

mod billing_period {
    use super::*;

    #[test]
    fn test_new_rejects_month_out_of_range() {
        assert!(matches!(BillingPeriod::new(2018, 0), Err(TemporalError::InvalidPeriod(_))));
        assert!(matches!(BillingPeriod::new(2018, 13), Err(TemporalError::InvalidPeriod(_))));
    }

    #[test]
    fn test_of_timestamp() {
        let ts = Utc.with_ymd_and_hms(2018, 1, 1, 1, 1, 4).unwrap();
        assert_eq!(BillingPeriod::of(ts), period(2018, 1));
    }

    #[test]
    fn test_ordering_across_years() {
        assert!(period(2017, 12) < period(2018, 1));
        assert!(period(2018, 2) > period(2018, 1));
    }

    #[test]
    fn test_months_until() {
        assert_eq!(period(2017, 12).months_until(&period(2019, 6)), 18);
        assert_eq!(period(2018, 3).months_until(&period(2018, 1)), -2);
    }

    #[test]
    fn test_first_day() {
        assert_eq!(period(2018, 2).first_day(), NaiveDate::from_ymd_opt(2018, 2, 1));
    }

    #[test]
    fn test_serde_uses_display_form() {
        let json = serde_json::to_string(&period(2018, 1)).unwrap();
        assert_eq!(json, "\"2018-01\"");
        let back: BillingPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period(2018, 1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("January".parse::<BillingPeriod>().is_err());
        assert!("2018/01".parse::<BillingPeriod>().is_err());
    }
}

mod commitment_term {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_term_requires_start_before_end() {
        let result = CommitmentTerm::new(date(2019, 6, 25), date(2017, 12, 25));
        assert!(matches!(result, Err(TemporalError::InvalidTerm { .. })));
    }

    #[test]
    fn test_fulfilment_starts_in_end_month() {
        let term = CommitmentTerm::new(date(2017, 12, 25), date(2019, 6, 25)).unwrap();

        assert_eq!(term.start_period(), period(2017, 12));
        assert!(!term.is_fulfilled_by(&period(2019, 5)));
        assert!(term.is_fulfilled_by(&period(2019, 6)));
        assert!(term.is_fulfilled_by(&period(2019, 7)));
    }
}
