//! Tests for domain_billing

use rust_decimal_macros::dec;

use core_kernel::{BillingPeriod, CommitmentTerm, Currency, Money};
use domain_billing::{
    BillingEngine, BillingError, ChargeRule, Contract, ContractKind, LineState, MonthToMonth,
    PhoneLine, RateCard, SummaryStatus,
};
use test_utils::{
    assert_breakdown_balanced, assert_fixed_only, assert_money_eq, assert_within_allotment,
    CallBuilder, ContractFixtures, MoneyFixtures, NumberFixtures, TemporalFixtures,
};

fn january_line(number: &str, contract: Contract) -> PhoneLine {
    PhoneLine::new(
        core_kernel::CustomerId::new(),
        number,
        contract,
        TemporalFixtures::january(),
    )
    .unwrap()
}

// ============================================================================
// Contract Strategy Tests
// ============================================================================

mod month_to_month_tests {
    use super::*;

    #[test]
    fn test_free_minutes_then_overage() {
        let contract = ContractFixtures::mtm_with_free_minutes();
        let calls: Vec<_> = (0..3)
            .map(|i| {
                CallBuilder::new()
                    .in_period(TemporalFixtures::january(), i * 3600)
                    .minutes(50)
                    .build()
            })
            .collect();

        let summary = contract.compute_cost(TemporalFixtures::january(), &calls).unwrap();

        assert_eq!(summary.free_minutes_used, 100);
        assert_eq!(summary.billed_minutes_used, 50);
        assert_money_eq(&summary.total_cost, dec!(22.50));
        assert_money_eq(&summary.total_for(ChargeRule::Usage), dec!(2.50));
        assert_breakdown_balanced(&summary);
    }

    #[test]
    fn test_call_straddling_boundary_is_split() {
        let contract = ContractFixtures::mtm_with_free_minutes();
        let calls = vec![
            CallBuilder::new().in_period(TemporalFixtures::january(), 0).minutes(80).build(),
            CallBuilder::new().in_period(TemporalFixtures::january(), 9000).minutes(30).build(),
        ];

        let summary = contract.compute_cost(TemporalFixtures::january(), &calls).unwrap();

        assert_eq!(summary.free_minutes_used, 100);
        assert_eq!(summary.billed_minutes_used, 10);
        assert_money_eq(&summary.total_cost, dec!(20.50));
    }

    #[test]
    fn test_partial_minutes_round_up_per_call() {
        let contract = Contract::month_to_month(&RateCard::default());
        let calls = vec![
            CallBuilder::new().in_period(TemporalFixtures::january(), 0).seconds(10).build(),
            CallBuilder::new().in_period(TemporalFixtures::january(), 60).seconds(61).build(),
        ];

        let summary = contract.compute_cost(TemporalFixtures::january(), &calls).unwrap();

        assert_eq!(summary.billed_minutes_used, 3);
        assert_money_eq(&summary.total_cost, dec!(50.15));
    }

    #[test]
    fn test_incoming_calls_are_free() {
        let contract = Contract::month_to_month(&RateCard::default());
        let calls = vec![CallBuilder::new().minutes(30).incoming().build()];

        let summary = contract.compute_cost(TemporalFixtures::january(), &calls).unwrap();

        assert_fixed_only(&summary);
        assert_money_eq(&summary.total_cost, dec!(50));
    }

    #[test]
    fn test_calls_outside_period_are_rejected() {
        let contract = ContractFixtures::mtm_with_free_minutes();
        let calls = vec![CallBuilder::new().in_period(TemporalFixtures::first_period(), 0).build()];

        let result = contract.compute_cost(TemporalFixtures::january(), &calls);

        assert!(matches!(result, Err(BillingError::OutsideBillingPeriod { .. })));
    }

    #[test]
    fn test_compute_cost_rates_in_chronological_order() {
        let contract = ContractFixtures::mtm_with_free_minutes();
        let later = CallBuilder::new().in_period(TemporalFixtures::january(), 7200).minutes(90).build();
        let earlier = CallBuilder::new().in_period(TemporalFixtures::january(), 0).minutes(20).build();

        let summary = contract
            .compute_cost(TemporalFixtures::january(), &[later, earlier])
            .unwrap();

        assert_eq!(summary.free_minutes_used, 100);
        assert_eq!(summary.billed_minutes_used, 10);
    }
}

mod prepaid_tests {
    use super::*;

    #[test]
    fn test_uncovered_call_is_logged_with_shortfall() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::prepaid_without_top_up());
        let call = CallBuilder::new().from_number(NumberFixtures::PREPAID).minutes(150).build();
        let call_id = call.id();

        let result = line.make_call(call);

        match result {
            Err(BillingError::InsufficientBalance { shortfall, .. }) => assert_eq!(shortfall, dec!(5)),
            other => panic!("Expected InsufficientBalance, got {:?}", other),
        }
        assert_eq!(line.history().len(), 1);

        let summary = line.start_new_month().unwrap();
        let balance = summary.balance.expect("prepaid bills carry a balance statement");

        assert_eq!(summary.status, SummaryStatus::Partial);
        assert_eq!(summary.unbillable_calls, vec![call_id]);
        assert_money_eq(&summary.total_cost, dec!(15));
        assert_money_eq(&balance.shortfall, dec!(5));
        assert_money_eq(&balance.drawn, dec!(10));
        assert!(balance.closing.is_zero());
    }

    #[test]
    fn test_covered_calls_draw_down_balance() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::published_prepaid());
        let call = CallBuilder::new().from_number(NumberFixtures::PREPAID).seconds(50).build();

        let charge = line.make_call(call).unwrap();

        assert_money_eq(&charge.cost, dec!(0.025));
        assert_money_eq(&line.usage().prepaid().unwrap().balance(), dec!(99.975));
    }

    #[test]
    fn test_auto_top_up_covers_overdraw() {
        let mut line = january_line(NumberFixtures::PREPAID, Contract::prepaid(&RateCard::default(), dec!(12)));
        // 1000 minutes at 0.025 = 25.00, 13.00 over the balance
        let call = CallBuilder::new().from_number(NumberFixtures::PREPAID).minutes(1000).build();

        line.make_call(call).unwrap();
        let summary = line.start_new_month().unwrap();
        let balance = summary.balance.unwrap();

        assert_eq!(summary.status, SummaryStatus::Complete);
        assert_money_eq(&balance.top_ups, dec!(25));
        assert_money_eq(&balance.closing, dec!(12));
    }

    #[test]
    fn test_balance_carries_into_next_month() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::published_prepaid());
        line.make_call(CallBuilder::new().from_number(NumberFixtures::PREPAID).minutes(40).build())
            .unwrap();

        line.start_new_month().unwrap();

        let opening = line.usage().prepaid().unwrap().statement().opening;
        assert_money_eq(&opening, dec!(99));
    }

    #[test]
    fn test_late_arriving_call_is_rated_in_arrival_order() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::prepaid_without_top_up());
        let later = CallBuilder::new()
            .from_number(NumberFixtures::PREPAID)
            .in_period(TemporalFixtures::january(), 7200)
            .minutes(100)
            .build();
        let earlier = CallBuilder::new()
            .from_number(NumberFixtures::PREPAID)
            .in_period(TemporalFixtures::january(), 3600)
            .minutes(10)
            .build();
        let earlier_id = earlier.id();

        line.make_call(later).unwrap();
        let result = line.make_call(earlier);

        assert!(matches!(result, Err(BillingError::InsufficientBalance { .. })));
        assert_eq!(line.history().calls()[0].id(), earlier_id);
        assert_eq!(line.usage().unbillable_calls(), &[earlier_id]);
    }

    #[test]
    fn test_manual_top_up() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::prepaid_without_top_up());

        let balance = line.top_up(MoneyFixtures::cad(dec!(5))).unwrap();

        assert_money_eq(&balance, dec!(15));
        assert!(line.top_up(Money::new(dec!(5), Currency::USD)).is_err());
        assert!(line.top_up(MoneyFixtures::cad_zero()).is_err());
    }

    #[test]
    fn test_top_up_rejected_on_postpaid_line() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        let result = line.top_up(MoneyFixtures::cad(dec!(5)));

        assert!(matches!(result, Err(BillingError::InvalidContract(_))));
    }
}

mod term_tests {
    use super::*;

    #[test]
    fn test_first_month_includes_deposit() {
        let contract = ContractFixtures::published_term();

        let summary = contract.compute_cost(TemporalFixtures::first_period(), &[]).unwrap();

        assert_money_eq(&summary.total_cost, dec!(320));
        assert_money_eq(&summary.total_for(ChargeRule::Deposit), dec!(300));
    }

    #[test]
    fn test_included_and_added_free_minutes() {
        let contract = match ContractFixtures::published_term() {
            Contract::Term(term) => Contract::Term(term.with_added_free_minutes(20)),
            _ => unreachable!(),
        };
        let calls = vec![CallBuilder::new().minutes(130).build()];

        let summary = contract.compute_cost(TemporalFixtures::january(), &calls).unwrap();

        assert_eq!(summary.free_minutes_allotted, 120);
        assert_eq!(summary.billed_minutes_used, 10);
        assert_money_eq(&summary.total_cost, dec!(21));
    }

    #[test]
    fn test_early_cancellation_adds_penalty() {
        let mut line = january_line(NumberFixtures::TERM, ContractFixtures::published_term());

        let summary = line.cancel().unwrap();

        assert!(summary.is_final);
        assert_money_eq(&summary.total_for(ChargeRule::EarlyCancellationPenalty), dec!(50));
        assert_money_eq(&summary.total_cost, dec!(70));
        assert!(summary.total_for(ChargeRule::DepositRefund).is_zero());
    }

    #[test]
    fn test_cancellation_after_term_refunds_deposit() {
        let short_term = CommitmentTerm::new(
            TemporalFixtures::contract_start(),
            chrono::NaiveDate::from_ymd_opt(2018, 1, 15).unwrap(),
        )
        .unwrap();
        let contract = Contract::term(&RateCard::default(), short_term);
        let mut line = PhoneLine::new(
            core_kernel::CustomerId::new(),
            NumberFixtures::TERM,
            contract,
            TemporalFixtures::first_period(),
        )
        .unwrap();

        let first = line.start_new_month().unwrap();
        let last = line.cancel().unwrap();

        assert_money_eq(&first.total_cost, dec!(320));
        assert_money_eq(&last.total_for(ChargeRule::DepositRefund), dec!(-300));
        assert_money_eq(&last.total_cost, dec!(-280));
        assert_breakdown_balanced(&last);
    }

    #[test]
    fn test_line_opened_after_term_start_pays_no_deposit() {
        let mut line = january_line(NumberFixtures::TERM, ContractFixtures::published_term());

        let january = line.start_new_month().unwrap();
        let february = line.cancel().unwrap();

        assert!(january.total_for(ChargeRule::Deposit).is_zero());
        assert_money_eq(&january.total_cost, dec!(20));
        assert!(february.total_for(ChargeRule::DepositRefund).is_zero());
        assert_money_eq(&february.total_cost, dec!(70));
    }

    #[test]
    fn test_unpaid_deposit_is_not_refunded_at_term_end() {
        let mut line = PhoneLine::new(
            core_kernel::CustomerId::new(),
            NumberFixtures::TERM,
            ContractFixtures::published_term(),
            BillingPeriod::new(2019, 6).unwrap(),
        )
        .unwrap();

        let last = line.cancel().unwrap();

        assert!(last.total_for(ChargeRule::DepositRefund).is_zero());
        assert!(last.total_for(ChargeRule::EarlyCancellationPenalty).is_zero());
        assert!(!last.total_cost.is_negative());
        assert_money_eq(&last.total_cost, dec!(20));
    }
}

// ============================================================================
// Phone Line Tests
// ============================================================================

mod line_tests {
    use super::*;

    #[test]
    fn test_second_month_start_bills_fixed_rate_only() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::mtm_with_free_minutes());
        line.make_call(CallBuilder::new().minutes(150).build()).unwrap();

        let first = line.start_new_month().unwrap();
        let second = line.start_new_month().unwrap();

        assert_money_eq(&first.total_cost, dec!(22.50));
        assert_fixed_only(&second);
        assert_money_eq(&second.total_cost, dec!(20));
        assert_eq!(second.period, BillingPeriod::new(2018, 2).unwrap());
        assert!(line.history().is_empty());
    }

    #[test]
    fn test_bills_are_archived_by_period() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        line.start_new_month().unwrap();

        assert!(line.bill(&TemporalFixtures::january()).is_some());
        assert_eq!(line.period(), BillingPeriod::new(2018, 2).unwrap());
        assert!(line.bill(&line.period()).is_none());
    }

    #[test]
    fn test_cancel_twice_fails() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        line.cancel().unwrap();
        let second = line.cancel();

        assert!(matches!(second, Err(BillingError::LineCancelled(_))));
        assert_eq!(line.state(), LineState::Cancelled);
    }

    #[test]
    fn test_calls_rejected_after_cancel() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());
        line.cancel().unwrap();

        let outgoing = line.make_call(CallBuilder::new().build());
        let incoming = line.receive_call(
            CallBuilder::new().from_number(NumberFixtures::TERM).to_number(NumberFixtures::MTM).incoming().build(),
        );

        assert!(matches!(outgoing, Err(BillingError::LineCancelled(_))));
        assert!(matches!(incoming, Err(BillingError::LineCancelled(_))));
        assert!(line.history().is_empty());
        assert!(matches!(line.start_new_month(), Err(BillingError::LineCancelled(_))));
    }

    #[test]
    fn test_call_for_other_number_is_rejected() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        let foreign = line.make_call(CallBuilder::new().from_number(NumberFixtures::TERM).build());
        let wrong_direction = line.make_call(CallBuilder::new().incoming().build());

        assert!(matches!(foreign, Err(BillingError::InvalidCall(_))));
        assert!(matches!(wrong_direction, Err(BillingError::InvalidCall(_))));
        assert!(line.history().is_empty());
    }

    #[test]
    fn test_call_outside_open_month_is_rejected() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        let result = line.make_call(
            CallBuilder::new().in_period(BillingPeriod::new(2018, 2).unwrap(), 0).build(),
        );

        assert!(matches!(result, Err(BillingError::OutsideBillingPeriod { .. })));
        assert!(line.history().is_empty());
    }

    #[test]
    fn test_live_bill_matches_recomputation() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::mtm_with_free_minutes());
        for (i, minutes) in [45, 30, 40, 12].into_iter().enumerate() {
            line.make_call(
                CallBuilder::new()
                    .in_period(TemporalFixtures::january(), (i as u32) * 4000)
                    .minutes(minutes)
                    .build(),
            )
            .unwrap();
        }
        let calls = line.history().calls().to_vec();
        let expected = line.contract().compute_cost(line.period(), &calls).unwrap();

        let actual = line.start_new_month().unwrap();

        assert_eq!(actual.total_cost, expected.total_cost);
        assert_eq!(actual.breakdown, expected.breakdown);
        assert_eq!(actual.billed_minutes_used, expected.billed_minutes_used);
        assert_eq!(actual.free_minutes_used, expected.free_minutes_used);
    }

    #[test]
    fn test_oversized_calls_saturate_minute_counters() {
        let mut line = january_line(NumberFixtures::MTM, ContractFixtures::published_mtm());

        for _ in 0..61 {
            line.make_call(CallBuilder::new().seconds(u32::MAX as i64).build()).unwrap();
        }
        let summary = line.start_new_month().unwrap();

        assert_eq!(summary.billed_minutes_used, u32::MAX);
        assert!(line.history().is_empty());
    }

    #[test]
    fn test_blank_number_is_rejected() {
        let result = PhoneLine::new(
            core_kernel::CustomerId::new(),
            "  ",
            ContractFixtures::published_mtm(),
            TemporalFixtures::january(),
        );
        assert!(matches!(result, Err(BillingError::InvalidCall(_))));
    }
}

// ============================================================================
// Billing Engine Tests
// ============================================================================

mod engine_tests {
    use super::*;
    use core_kernel::{CustomerId, LineId};

    struct SampleCustomer {
        engine: BillingEngine,
        customer: CustomerId,
        term: LineId,
        mtm: LineId,
        prepaid: LineId,
    }

    fn sample_customer() -> SampleCustomer {
        let mut engine = BillingEngine::new(TemporalFixtures::first_period(), Currency::CAD);
        let customer = engine.register_customer("5555");
        let term = engine
            .register_line(customer, NumberFixtures::TERM, ContractFixtures::published_term())
            .unwrap();
        let mtm = engine
            .register_line(customer, NumberFixtures::MTM, ContractFixtures::published_mtm())
            .unwrap();
        let prepaid = engine
            .register_line(customer, NumberFixtures::PREPAID, ContractFixtures::published_prepaid())
            .unwrap();
        SampleCustomer { engine, customer, term, mtm, prepaid }
    }

    fn route(engine: &mut BillingEngine, from: &str, to: &str, offset: u32, seconds: i64) {
        let call = CallBuilder::new()
            .from_number(from)
            .to_number(to)
            .in_period(TemporalFixtures::january(), offset)
            .seconds(seconds)
            .build();
        engine.route_call(call).unwrap();
    }

    #[test]
    fn test_first_cycle_bills_fixed_charges() {
        let mut sample = sample_customer();

        let bills = sample.engine.run_billing_cycle();

        assert_eq!(bills.len(), 3);
        assert_money_eq(&bills[&sample.term].total_cost, dec!(320));
        assert_money_eq(&bills[&sample.mtm].total_cost, dec!(50));
        assert!(bills[&sample.prepaid].total_cost.is_zero());

        let statement = sample
            .engine
            .customer_statement(&sample.customer, TemporalFixtures::first_period())
            .unwrap();
        assert_money_eq(&statement.total, dec!(370));
        assert_eq!(statement.reference, "5555");
        assert_eq!(sample.engine.period(), TemporalFixtures::january());
    }

    #[test]
    fn test_routed_calls_bill_both_ends() {
        let mut sample = sample_customer();
        sample.engine.run_billing_cycle();

        route(&mut sample.engine, NumberFixtures::MTM, NumberFixtures::TERM, 4, 10);
        route(&mut sample.engine, NumberFixtures::TERM, NumberFixtures::PREPAID, 5, 50);
        route(&mut sample.engine, NumberFixtures::PREPAID, NumberFixtures::MTM, 6, 50);

        let term_line = sample.engine.line(&sample.term).unwrap();
        assert_eq!(term_line.history().incoming().count(), 1);
        assert_eq!(term_line.history().outgoing().count(), 1);

        let bills = sample.engine.run_billing_cycle();
        let term = &bills[&sample.term];
        let mtm = &bills[&sample.mtm];
        let prepaid = &bills[&sample.prepaid];

        assert_eq!(term.free_minutes_used, 1);
        assert_money_eq(&term.total_cost, dec!(20));
        assert_eq!(mtm.billed_minutes_used, 1);
        assert_money_eq(&mtm.total_cost, dec!(50.05));
        assert_eq!(prepaid.billed_minutes_used, 1);
        assert_money_eq(&prepaid.total_cost, dec!(0.025));

        let statement = sample
            .engine
            .customer_statement(&sample.customer, TemporalFixtures::january())
            .unwrap();
        assert_money_eq(&statement.total, dec!(70.075));
        assert_eq!(statement.lines.len(), 3);
    }

    #[test]
    fn test_route_to_outside_number_logs_source_only() {
        let mut sample = sample_customer();
        sample.engine.run_billing_cycle();

        route(&mut sample.engine, NumberFixtures::MTM, NumberFixtures::OUTSIDE, 0, 120);

        let mtm = sample.engine.line(&sample.mtm).unwrap();
        assert_eq!(mtm.history().len(), 1);
        assert_eq!(mtm.usage().billed_minutes(), 2);
    }

    #[test]
    fn test_route_between_unknown_numbers_fails() {
        let mut sample = sample_customer();
        let call = CallBuilder::new()
            .from_number("000-0000")
            .to_number(NumberFixtures::OUTSIDE)
            .in_period(TemporalFixtures::first_period(), 0)
            .build();

        let result = sample.engine.route_call(call);

        assert!(matches!(result, Err(BillingError::LineNotFound(_))));
    }

    #[test]
    fn test_partial_line_does_not_abort_cycle() {
        let mut engine = BillingEngine::new(TemporalFixtures::january(), Currency::CAD);
        let customer = engine.register_customer("1111");
        let prepaid = engine
            .register_line(customer, NumberFixtures::PREPAID, ContractFixtures::prepaid_without_top_up())
            .unwrap();
        let mtm = engine
            .register_line(customer, NumberFixtures::MTM, ContractFixtures::mtm_with_free_minutes())
            .unwrap();

        let call = CallBuilder::new().from_number(NumberFixtures::PREPAID).minutes(150).build();
        let result = engine.log_call(prepaid, call);
        assert!(matches!(result, Err(BillingError::InsufficientBalance { .. })));

        let bills = engine.run_billing_cycle();

        assert_eq!(bills.len(), 2);
        assert!(bills[&prepaid].is_partial());
        assert_money_eq(&bills[&prepaid].shortfall(), dec!(5));
        assert_eq!(bills[&mtm].status, SummaryStatus::Complete);
    }

    #[test]
    fn test_cancelled_line_leaves_cycle_and_routing() {
        let mut sample = sample_customer();

        let final_bill = sample.engine.cancel_line(sample.mtm).unwrap();
        let again = sample.engine.cancel_line(sample.mtm);
        let bills = sample.engine.run_billing_cycle();

        assert!(final_bill.is_final);
        assert!(matches!(again, Err(BillingError::LineCancelled(_))));
        assert_eq!(bills.len(), 2);
        assert!(!bills.contains_key(&sample.mtm));
        assert!(sample.engine.line_by_number(NumberFixtures::MTM).is_none());
        assert!(sample.engine.line(&sample.mtm).is_some());

        let statement = sample
            .engine
            .customer_statement(&sample.customer, TemporalFixtures::first_period())
            .unwrap();
        assert_eq!(statement.lines.len(), 3);
    }

    #[test]
    fn test_log_call_on_cancelled_line_fails() {
        let mut sample = sample_customer();
        sample.engine.cancel_line(sample.mtm).unwrap();
        let call = CallBuilder::new()
            .in_period(TemporalFixtures::first_period(), 0)
            .build();

        let result = sample.engine.log_call(sample.mtm, call);

        assert!(matches!(result, Err(BillingError::LineCancelled(_))));
    }

    #[test]
    fn test_registration_errors() {
        let mut sample = sample_customer();

        let duplicate = sample.engine.register_line(
            sample.customer,
            NumberFixtures::MTM,
            ContractFixtures::published_mtm(),
        );
        let unknown_customer = sample.engine.register_line(
            CustomerId::new(),
            "111-2222",
            ContractFixtures::published_mtm(),
        );
        let foreign_currency = sample.engine.register_line(
            sample.customer,
            "111-3333",
            Contract::MonthToMonth(MonthToMonth::new(
                Money::new(dec!(50), Currency::USD),
                Money::new(dec!(0.05), Currency::USD),
            )),
        );

        assert!(matches!(duplicate, Err(BillingError::DuplicateNumber(_))));
        assert!(matches!(unknown_customer, Err(BillingError::CustomerNotFound(_))));
        assert!(matches!(foreign_currency, Err(BillingError::InvalidContract(_))));
        assert_eq!(sample.engine.customer(&sample.customer).unwrap().lines.len(), 3);
    }

    #[test]
    fn test_engine_top_up() {
        let mut sample = sample_customer();

        let balance = sample.engine.top_up(sample.prepaid, MoneyFixtures::cad(dec!(5))).unwrap();

        assert_money_eq(&balance, dec!(105));
        assert!(sample.engine.top_up(sample.mtm, MoneyFixtures::cad(dec!(5))).is_err());
        assert!(matches!(
            sample.engine.top_up(LineId::new(), MoneyFixtures::cad(dec!(5))),
            Err(BillingError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_term_line_registered_after_start_month() {
        let mut engine = BillingEngine::new(BillingPeriod::new(2019, 5).unwrap(), Currency::CAD);
        let customer = engine.register_customer("7777");
        let term = engine
            .register_line(customer, NumberFixtures::TERM, ContractFixtures::published_term())
            .unwrap();

        let bills = engine.run_billing_cycle();
        let final_bill = engine.cancel_line(term).unwrap();

        assert_money_eq(&bills[&term].total_cost, dec!(20));
        assert_eq!(final_bill.period, BillingPeriod::new(2019, 6).unwrap());
        assert!(final_bill.total_for(ChargeRule::DepositRefund).is_zero());
        assert_money_eq(&final_bill.total_cost, dec!(20));

        let statement = engine
            .customer_statement(&customer, BillingPeriod::new(2019, 6).unwrap())
            .unwrap();
        assert_money_eq(&statement.total, dec!(20));
    }

    #[test]
    fn test_lines_keep_contract_kinds() {
        let sample = sample_customer();
        let kinds: Vec<_> = sample.engine.lines().map(|l| l.contract().kind()).collect();

        assert_eq!(kinds, vec![ContractKind::Term, ContractKind::MonthToMonth, ContractKind::Prepaid]);
    }
}

// ============================================================================
// Bill Summary Tests
// ============================================================================

mod summary_tests {
    use super::*;
    use domain_billing::BillSummary;

    #[test]
    fn test_summary_json_round_trip() {
        let mut line = january_line(NumberFixtures::PREPAID, ContractFixtures::prepaid_without_top_up());
        let _ = line.make_call(CallBuilder::new().from_number(NumberFixtures::PREPAID).minutes(150).build());
        let summary = line.start_new_month().unwrap();

        let json = serde_json::to_string(&summary).unwrap();
        let back: BillSummary = serde_json::from_str(&json).unwrap();

        assert_eq!(back.total_cost, summary.total_cost);
        assert_eq!(back.breakdown, summary.breakdown);
        assert_eq!(back, summary);
    }

    #[test]
    fn test_allotment_reported() {
        let mut line = january_line(NumberFixtures::TERM, ContractFixtures::published_term());
        line.make_call(CallBuilder::new().from_number(NumberFixtures::TERM).minutes(250).build())
            .unwrap();

        let summary = line.start_new_month().unwrap();

        assert_within_allotment(&summary);
        assert_eq!(summary.free_minutes_used, 100);
        assert_eq!(summary.billed_minutes_used, 150);
        assert_money_eq(&summary.total_cost, dec!(35));
    }
}
