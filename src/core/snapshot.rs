//! Single recomputation pipeline: entries → aggregate → reliefs → brackets.

use super::aggregate::{aggregate, Aggregate};
use super::bracket::{compute_tax, BracketSlice};
use super::entry::Entry;
use super::error::EngineError;
use super::relief::{
    balance_payable, check_qualifying_caps, resolve_reliefs, ReliefBreakdown, TaxCredits,
};
use super::warnings::Warning;
use super::year::{RateTable, TaxYear, YearRates};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Fully computed state for one set of entries. Never mutated; every edit
/// produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateSnapshot {
    pub tax_year: TaxYear,
    #[serde(rename = "category_summaries")]
    pub summaries: Aggregate,
    pub gross_income: Decimal,
    pub qualifying_payments: Decimal,
    pub assessable_income: Decimal,
    pub reliefs: ReliefBreakdown,
    pub relief_total: Decimal,
    pub taxable_income: Decimal,
    pub tax_liability: Decimal,
    /// Liability as a fraction of gross income
    pub effective_rate: Decimal,
    pub bracket_breakdown: Vec<BracketSlice>,
    pub tax_credits: TaxCredits,
    pub total_tax_credits: Decimal,
    pub balance_payable: Decimal,
    pub warnings: Vec<Warning>,
}

/// Compute a snapshot for `year`, looking its rates up in `table`
pub fn assess<I>(
    entries: I,
    year: TaxYear,
    table: &RateTable,
) -> Result<AggregateSnapshot, EngineError>
where
    I: IntoIterator<Item = Entry>,
{
    let rates = table.rates(year)?;
    Ok(assess_with_rates(entries, year, rates))
}

pub fn assess_with_rates<I>(entries: I, year: TaxYear, rates: &YearRates) -> AggregateSnapshot
where
    I: IntoIterator<Item = Entry>,
{
    let summaries = aggregate(entries);

    let gross_income = summaries.gross_income();
    let qualifying_payments = summaries.qualifying_payments();
    let assessable_income = summaries.assessable_income();

    let reliefs = resolve_reliefs(&summaries, rates);
    let relief_total = reliefs.statutory_total();
    let taxable_income = (assessable_income - relief_total).max(Decimal::ZERO);

    let computation = compute_tax(taxable_income, &rates.brackets);
    let tax_liability = computation.total_tax;
    let effective_rate = if gross_income.is_zero() {
        Decimal::ZERO
    } else {
        tax_liability / gross_income
    };

    let tax_credits = TaxCredits::from_aggregate(&summaries);
    let total_tax_credits = tax_credits.total();
    let balance_payable = balance_payable(tax_liability, &tax_credits);

    let warnings = check_qualifying_caps(&summaries, rates);

    log::info!(
        "Assessed {}: assessable {:.2}, taxable {:.2}, liability {:.2}, balance {:.2}",
        year,
        assessable_income,
        taxable_income,
        tax_liability,
        balance_payable
    );

    AggregateSnapshot {
        tax_year: year,
        summaries,
        gross_income,
        qualifying_payments,
        assessable_income,
        reliefs,
        relief_total,
        taxable_income,
        tax_liability,
        effective_rate,
        bracket_breakdown: computation.slices,
        tax_credits,
        total_tax_credits,
        balance_payable,
        warnings,
    }
}

impl AggregateSnapshot {
    /// All entries, in canonical category order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.summaries.entries()
    }

    /// SHA-256 of the snapshot's JSON form, hex encoded
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::{EntryId, Provenance};
    use crate::core::taxonomy::{Category, CategoryType};
    use rust_decimal_macros::dec;

    fn entry(id: usize, leaf: CategoryType, amount: Decimal) -> Entry {
        Entry {
            id: EntryId(id),
            description: leaf.label().to_string(),
            amount,
            category: leaf.home_category(),
            category_type: leaf,
            kind: leaf.kind(),
            provenance: Provenance::Manual,
        }
    }

    fn assess_2025(entries: Vec<Entry>) -> AggregateSnapshot {
        assess(entries, TaxYear(2025), &RateTable::builtin()).unwrap()
    }

    #[test]
    fn employment_within_personal_relief_owes_nothing() {
        let snapshot = assess_2025(vec![entry(0, CategoryType::PrimaryEmployment, dec!(1000000))]);
        assert_eq!(snapshot.reliefs.personal_relief, Some(dec!(1000000)));
        assert_eq!(snapshot.taxable_income, Decimal::ZERO);
        assert_eq!(snapshot.tax_liability, Decimal::ZERO);
        assert_eq!(snapshot.balance_payable, Decimal::ZERO);
        assert!(snapshot.bracket_breakdown.is_empty());
    }

    #[test]
    fn full_pipeline() {
        let snapshot = assess_2025(vec![
            entry(0, CategoryType::PrimaryEmployment, dec!(2700000)),
            entry(1, CategoryType::ApitDeduction, dec!(100000)),
            entry(2, CategoryType::Donations, dec!(0)),
        ]);
        // 2,700,000 - 1,200,000 personal relief
        assert_eq!(snapshot.assessable_income, dec!(2700000));
        assert_eq!(snapshot.relief_total, dec!(1200000));
        assert_eq!(snapshot.taxable_income, dec!(1500000));
        assert_eq!(snapshot.tax_liability, dec!(180000));
        assert_eq!(snapshot.total_tax_credits, dec!(100000));
        assert_eq!(snapshot.balance_payable, dec!(80000));
        assert_eq!(snapshot.effective_rate, dec!(180000) / dec!(2700000));
    }

    #[test]
    fn credits_exceeding_liability_leave_zero_balance() {
        let snapshot = assess_2025(vec![
            entry(0, CategoryType::ServiceIncome, dec!(600000)),
            entry(1, CategoryType::Wht(crate::core::WhtSource::Service), dec!(90000)),
        ]);
        // 500,000 @ 6% + 100,000 @ 12%
        assert_eq!(snapshot.tax_liability, dec!(42000));
        assert_eq!(snapshot.balance_payable, Decimal::ZERO);
    }

    #[test]
    fn unknown_year_fails() {
        let result = assess(Vec::new(), TaxYear(2030), &RateTable::builtin());
        assert_eq!(
            result.unwrap_err(),
            EngineError::UnknownTaxYear("2029/2030".to_string())
        );
    }

    #[test]
    fn same_entries_same_snapshot_and_fingerprint() {
        let entries = vec![
            entry(0, CategoryType::RentalIncome, dec!(1000000)),
            entry(1, CategoryType::DividendIncome, dec!(250000.55)),
            entry(2, CategoryType::SolarInstallation, dec!(700000)),
        ];
        let a = assess_2025(entries.clone());
        let b = assess_2025(entries);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
        assert_eq!(a.reliefs.rental_relief, Some(dec!(225000)));
        assert_eq!(a.warnings.len(), 1);
    }

    #[test]
    fn recomputing_from_snapshot_entries_is_idempotent() {
        let first = assess_2025(vec![
            entry(0, CategoryType::CommutedPension, dec!(500000)),
            entry(1, CategoryType::PrimaryEmployment, dec!(4000000)),
            entry(2, CategoryType::AitDeduction, dec!(1000)),
        ]);
        let again = assess_2025(first.entries().cloned().collect());
        assert_eq!(first, again);
    }

    #[test]
    fn taxable_and_balance_never_negative() {
        let mut amount = Decimal::ZERO;
        while amount <= dec!(5000000) {
            let snapshot = assess_2025(vec![
                entry(0, CategoryType::PrimaryEmployment, amount),
                entry(1, CategoryType::Housing, dec!(800000)),
                entry(2, CategoryType::PaidTax, dec!(150000)),
            ]);
            assert!(snapshot.taxable_income >= Decimal::ZERO);
            assert!(snapshot.balance_payable >= Decimal::ZERO);
            assert_eq!(
                snapshot.bracket_breakdown.is_empty(),
                snapshot.taxable_income.is_zero()
            );
            assert!(snapshot
                .summaries
                .summary(Category::QualifyingPayments)
                .is_some());
            amount += dec!(250000);
        }
    }
}
