//! Engine scenarios through the public library surface

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use taxlk::core::{
    assess, ingest, Category, CategoryType, EditSession, EngineError, EntryId, EntryKind,
    RateTable, RawRecord, TaxInput, TaxYear, Warning,
};

fn year() -> TaxYear {
    TaxYear(2025)
}

fn assess_records(records: Vec<RawRecord>) -> taxlk::core::AggregateSnapshot {
    let input = TaxInput {
        records,
        documents: Vec::new(),
    };
    let ingest = ingest(&input).unwrap();
    assess(ingest.entries, year(), &RateTable::builtin()).unwrap()
}

fn salary(amount: Decimal) -> RawRecord {
    RawRecord::new("Salary", amount)
        .with_category("Employment Income")
        .with_type("Primary Employment")
}

#[test]
fn business_income_through_the_brackets() {
    let snapshot = assess_records(vec![
        RawRecord::new("Consulting practice", dec!(1500000)).with_category("Business Income"),
    ]);

    assert_eq!(snapshot.assessable_income, dec!(1500000));
    assert_eq!(snapshot.relief_total, Decimal::ZERO);
    assert_eq!(snapshot.taxable_income, dec!(1500000));
    assert_eq!(snapshot.tax_liability, dec!(180000));
    assert_eq!(snapshot.bracket_breakdown.len(), 3);
    assert_eq!(snapshot.balance_payable, dec!(180000));
}

#[test]
fn salary_within_personal_relief_owes_nothing() {
    let snapshot = assess_records(vec![salary(dec!(1000000))]);

    assert_eq!(snapshot.reliefs.personal_relief, Some(dec!(1000000)));
    assert_eq!(snapshot.taxable_income, Decimal::ZERO);
    assert_eq!(snapshot.tax_liability, Decimal::ZERO);
    assert_eq!(snapshot.balance_payable, Decimal::ZERO);
    assert_eq!(snapshot.effective_rate, Decimal::ZERO);
}

#[test]
fn capital_gain_hinted_as_business_is_investment() {
    let snapshot = assess_records(vec![
        RawRecord::new("Capital gain on sale of shares", dec!(300000))
            .with_category("Business Income"),
    ]);

    assert_eq!(snapshot.summaries.subtotal(Category::Business), Decimal::ZERO);
    assert_eq!(
        snapshot.summaries.total_of(CategoryType::CapitalGains),
        dec!(300000)
    );
}

#[test]
fn rental_relief_is_capped() {
    let snapshot = assess_records(vec![
        RawRecord::new("House rent", dec!(1000000)).with_type("Rental Income")
    ]);

    assert_eq!(snapshot.reliefs.rental_relief, Some(dec!(225000)));
    assert_eq!(snapshot.taxable_income, dec!(775000));
}

#[test]
fn credits_beyond_liability_leave_nothing_payable() {
    let snapshot = assess_records(vec![
        salary(dec!(1500000)),
        RawRecord::new("APIT", dec!(90000)).with_type("APIT Deduction"),
    ]);

    // 1.5M - 1.2M personal relief = 300k at 6%
    assert_eq!(snapshot.tax_liability, dec!(18000));
    assert_eq!(snapshot.total_tax_credits, dec!(90000));
    assert_eq!(snapshot.balance_payable, Decimal::ZERO);
}

#[test]
fn qualifying_payments_reduce_assessable_income() {
    let snapshot = assess_records(vec![
        RawRecord::new("Consulting practice", dec!(2000000)).with_category("Business Income"),
        RawRecord::new("Rooftop solar panels", dec!(400000))
            .with_category("Qualifying Payments & Relief")
            .with_type("Solar Installation"),
    ]);

    assert_eq!(snapshot.gross_income, dec!(2000000));
    assert_eq!(snapshot.qualifying_payments, dec!(400000));
    assert_eq!(snapshot.assessable_income, dec!(1600000));
    assert_eq!(snapshot.reliefs.solar_relief, Some(dec!(400000)));
    assert!(snapshot.warnings.is_empty());
}

#[test]
fn donation_over_cap_is_warned_not_trimmed() {
    let snapshot = assess_records(vec![
        salary(dec!(600000)),
        RawRecord::new("Temple donation", dec!(100000))
            .with_category("Qualifying Payments & Relief")
            .with_type("Donations"),
    ]);

    assert_eq!(snapshot.qualifying_payments, dec!(100000));
    assert_eq!(
        snapshot.warnings,
        vec![Warning::DonationCapExceeded {
            claimed: dec!(100000),
            cap: dec!(75000),
        }]
    );
}

#[test]
fn same_input_same_fingerprint() {
    let records = vec![
        salary(dec!(2500000)),
        RawRecord::new("Dividends", dec!(120000)).with_type("Dividend Income"),
    ];
    let first = assess_records(records.clone());
    let second = assess_records(records);

    assert_eq!(first, second);
    assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
}

#[test]
fn edit_session_undo_redo_round_trip() {
    let input = TaxInput {
        records: vec![salary(dec!(3000000))],
        documents: Vec::new(),
    };
    let entries = ingest(&input).unwrap().entries;
    let mut session = EditSession::new(entries, year(), &RateTable::builtin()).unwrap();
    let before = session.current().clone();

    let (id, added) = session
        .add_entry(
            Category::Other,
            EntryKind::Income,
            RawRecord::new("Royalties", dec!(200000)).with_type("Royalty Income"),
        )
        .unwrap();
    assert_eq!(id, EntryId(1));
    assert_eq!(added.gross_income, dec!(3200000));
    let after = added.clone();

    assert!(session.undo());
    assert_eq!(session.current(), &before);
    assert!(session.redo());
    assert_eq!(session.current(), &after);
    assert!(!session.can_redo());
}

#[test]
fn rejected_edit_keeps_history() {
    let input = TaxInput {
        records: vec![salary(dec!(3000000))],
        documents: Vec::new(),
    };
    let entries = ingest(&input).unwrap().entries;
    let mut session = EditSession::new(entries, year(), &RateTable::builtin()).unwrap();

    assert_eq!(
        session.update_entry_amount(EntryId(0), dec!(-1)).unwrap_err(),
        EngineError::InvalidAmount("-1".to_string())
    );
    assert_eq!(
        session.rename_entry(EntryId(0), "   ").unwrap_err(),
        EngineError::EmptyDescription
    );
    assert!(!session.can_undo());
    assert_eq!(session.current().gross_income, dec!(3000000));
}

#[test]
fn unknown_year_is_rejected() {
    let err = assess(Vec::new(), TaxYear(2019), &RateTable::builtin()).unwrap_err();
    assert!(matches!(err, EngineError::UnknownTaxYear(_)));
}
