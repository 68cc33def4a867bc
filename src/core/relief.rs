//! Statutory reliefs (deducted from assessable income) and tax credits
//! (deducted from liability).

use super::aggregate::Aggregate;
use super::taxonomy::{Category, CategoryType, CreditKind};
use super::warnings::Warning;
use super::year::YearRates;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One qualifying-payment leaf and its total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualifyingPayment {
    pub category_type: CategoryType,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

/// Reliefs for one assessment.
///
/// Personal and rental relief are statutory and come off assessable income.
/// Qualifying payments (solar included) were already taken off when
/// assessable income was formed; they are listed here so a report can show
/// every relief in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReliefBreakdown {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub personal_relief: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub rental_relief: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub solar_relief: Option<Decimal>,
    pub qualifying_payments: Vec<QualifyingPayment>,
}

impl ReliefBreakdown {
    /// Relief deducted from assessable income to reach taxable income
    pub fn statutory_total(&self) -> Decimal {
        self.personal_relief.unwrap_or_default() + self.rental_relief.unwrap_or_default()
    }

    pub fn qualifying_total(&self) -> Decimal {
        self.qualifying_payments.iter().map(|q| q.amount).sum()
    }
}

/// Personal relief applies only to positive employment income
pub fn personal_relief(employment_income: Decimal, cap: Decimal) -> Option<Decimal> {
    (employment_income > Decimal::ZERO).then(|| employment_income.min(cap))
}

/// Rental relief: a fixed share of rental income, capped
pub fn rental_relief(rental_income: Decimal, rate: Decimal, cap: Decimal) -> Option<Decimal> {
    (rental_income > Decimal::ZERO).then(|| (rental_income * rate).min(cap))
}

pub fn resolve_reliefs(aggregate: &Aggregate, rates: &YearRates) -> ReliefBreakdown {
    let employment_income = aggregate.subtotal(Category::Employment);
    let rental_income = aggregate.total_of(CategoryType::RentalIncome);
    let solar = aggregate.total_of(CategoryType::SolarInstallation);

    let qualifying_payments = CategoryType::ALL
        .into_iter()
        .filter(|leaf| leaf.home_category() == Category::QualifyingPayments)
        .map(|leaf| QualifyingPayment {
            category_type: leaf,
            amount: aggregate.total_of(leaf),
        })
        .filter(|q| q.amount > Decimal::ZERO)
        .collect();

    let breakdown = ReliefBreakdown {
        personal_relief: personal_relief(employment_income, rates.personal_relief_cap),
        rental_relief: rental_relief(
            rental_income,
            rates.rental_relief_rate,
            rates.rental_relief_cap,
        ),
        solar_relief: (solar > Decimal::ZERO).then_some(solar),
        qualifying_payments,
    };
    log::debug!("Reliefs: {:?}", breakdown);
    breakdown
}

/// Statutory ceilings on qualifying payments. Amounts are deducted as
/// entered either way; an excess only raises a warning.
pub fn check_qualifying_caps(aggregate: &Aggregate, rates: &YearRates) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let donations = aggregate.total_of(CategoryType::Donations);
    let donation_cap = (aggregate.assessable_income() / Decimal::from(3)).min(rates.donation_cap);
    if donations > donation_cap {
        log::warn!(
            "Donations {:.2} exceed allowable {:.2}",
            donations,
            donation_cap
        );
        warnings.push(Warning::DonationCapExceeded {
            claimed: donations,
            cap: donation_cap,
        });
    }

    let solar = aggregate.total_of(CategoryType::SolarInstallation);
    if solar > rates.solar_cap {
        log::warn!("Solar installation {:.2} exceeds cap {:.2}", solar, rates.solar_cap);
        warnings.push(Warning::SolarCapExceeded {
            claimed: solar,
            cap: rates.solar_cap,
        });
    }

    warnings
}

/// Tax credits by kind, subtracted from liability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxCredits {
    #[schemars(with = "f64")]
    pub apit: Decimal,
    #[schemars(with = "f64")]
    pub ait: Decimal,
    #[schemars(with = "f64")]
    pub paid_tax: Decimal,
    #[schemars(with = "f64")]
    pub wht: Decimal,
}

impl TaxCredits {
    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        let mut credits = TaxCredits::default();
        for summary in aggregate.summaries() {
            for deduction in &summary.deductions {
                if let Some(kind) = deduction.category_type.credit_kind() {
                    *credits.get_mut(kind) += deduction.amount;
                }
            }
        }
        credits
    }

    pub fn get(&self, kind: CreditKind) -> Decimal {
        match kind {
            CreditKind::Apit => self.apit,
            CreditKind::Ait => self.ait,
            CreditKind::PaidTax => self.paid_tax,
            CreditKind::Wht => self.wht,
        }
    }

    fn get_mut(&mut self, kind: CreditKind) -> &mut Decimal {
        match kind {
            CreditKind::Apit => &mut self.apit,
            CreditKind::Ait => &mut self.ait,
            CreditKind::PaidTax => &mut self.paid_tax,
            CreditKind::Wht => &mut self.wht,
        }
    }

    pub fn total(&self) -> Decimal {
        self.apit + self.ait + self.paid_tax + self.wht
    }
}

/// Liability less credits, never negative. Excess credits are not refunded.
pub fn balance_payable(tax_liability: Decimal, credits: &TaxCredits) -> Decimal {
    (tax_liability - credits.total()).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::aggregate;
    use crate::core::entry::{Entry, EntryId, Provenance};
    use crate::core::taxonomy::WhtSource;
    use crate::core::year::{RateTable, TaxYear};
    use rust_decimal_macros::dec;

    fn rates_2025() -> YearRates {
        RateTable::builtin().rates(TaxYear(2025)).unwrap().clone()
    }

    fn entry(leaf: CategoryType, amount: Decimal) -> Entry {
        Entry {
            id: EntryId(0),
            description: leaf.label().to_string(),
            amount,
            category: leaf.home_category(),
            category_type: leaf,
            kind: leaf.kind(),
            provenance: Provenance::Manual,
        }
    }

    #[test]
    fn personal_relief_capped_per_year() {
        assert_eq!(
            personal_relief(dec!(1000000), dec!(1200000)),
            Some(dec!(1000000))
        );
        assert_eq!(
            personal_relief(dec!(3000000), dec!(1200000)),
            Some(dec!(1200000))
        );
        assert_eq!(personal_relief(Decimal::ZERO, dec!(1200000)), None);
    }

    #[test]
    fn rental_relief_cap_applies() {
        // 25% of 1,000,000 = 250,000 > 225,000
        assert_eq!(
            rental_relief(dec!(1000000), dec!(0.25), dec!(225000)),
            Some(dec!(225000))
        );
        assert_eq!(
            rental_relief(dec!(400000), dec!(0.25), dec!(225000)),
            Some(dec!(100000))
        );
        assert_eq!(rental_relief(Decimal::ZERO, dec!(0.25), dec!(225000)), None);
    }

    #[test]
    fn resolve_from_aggregate() {
        let agg = aggregate(vec![
            entry(CategoryType::PrimaryEmployment, dec!(900000)),
            entry(CategoryType::SecondaryEmployment, dec!(600000)),
            entry(CategoryType::RentalIncome, dec!(600000)),
            entry(CategoryType::RentalIncome, dec!(400000)),
            entry(CategoryType::SolarInstallation, dec!(300000)),
            entry(CategoryType::Donations, dec!(20000)),
        ]);
        let reliefs = resolve_reliefs(&agg, &rates_2025());
        assert_eq!(reliefs.personal_relief, Some(dec!(1200000)));
        assert_eq!(reliefs.rental_relief, Some(dec!(225000)));
        assert_eq!(reliefs.solar_relief, Some(dec!(300000)));
        assert_eq!(reliefs.statutory_total(), dec!(1425000));
        assert_eq!(reliefs.qualifying_total(), dec!(320000));
        assert_eq!(
            reliefs
                .qualifying_payments
                .iter()
                .map(|q| q.category_type)
                .collect::<Vec<_>>(),
            vec![CategoryType::Donations, CategoryType::SolarInstallation]
        );
    }

    #[test]
    fn no_employment_means_no_personal_relief() {
        let agg = aggregate(vec![entry(CategoryType::ServiceIncome, dec!(2000000))]);
        let reliefs = resolve_reliefs(&agg, &rates_2025());
        assert_eq!(reliefs.personal_relief, None);
        assert_eq!(reliefs.statutory_total(), Decimal::ZERO);
    }

    #[test]
    fn cap_warnings_without_changing_amounts() {
        let agg = aggregate(vec![
            entry(CategoryType::PrimaryEmployment, dec!(3000000)),
            entry(CategoryType::Donations, dec!(100000)),
            entry(CategoryType::SolarInstallation, dec!(700000)),
        ]);
        let warnings = check_qualifying_caps(&agg, &rates_2025());
        assert_eq!(
            warnings,
            vec![
                Warning::DonationCapExceeded {
                    claimed: dec!(100000),
                    cap: dec!(75000)
                },
                Warning::SolarCapExceeded {
                    claimed: dec!(700000),
                    cap: dec!(600000)
                },
            ]
        );
        let reliefs = resolve_reliefs(&agg, &rates_2025());
        assert_eq!(reliefs.qualifying_total(), dec!(800000));
    }

    #[test]
    fn donation_cap_is_a_third_of_assessable_income_when_lower() {
        // assessable = 150,000 - 60,000 = 90,000; a third is 30,000
        let agg = aggregate(vec![
            entry(CategoryType::ServiceIncome, dec!(150000)),
            entry(CategoryType::Donations, dec!(60000)),
        ]);
        let warnings = check_qualifying_caps(&agg, &rates_2025());
        assert_eq!(
            warnings,
            vec![Warning::DonationCapExceeded {
                claimed: dec!(60000),
                cap: dec!(30000)
            }]
        );
    }

    #[test]
    fn credits_summed_by_kind() {
        let agg = aggregate(vec![
            entry(CategoryType::ApitDeduction, dec!(100)),
            entry(CategoryType::AitDeduction, dec!(20)),
            entry(CategoryType::PaidTax, dec!(3)),
            entry(CategoryType::Wht(WhtSource::Royalty), dec!(0.5)),
            entry(CategoryType::Wht(WhtSource::General), dec!(0.25)),
        ]);
        let credits = TaxCredits::from_aggregate(&agg);
        assert_eq!(credits.get(CreditKind::Apit), dec!(100));
        assert_eq!(credits.get(CreditKind::Ait), dec!(20));
        assert_eq!(credits.get(CreditKind::PaidTax), dec!(3));
        assert_eq!(credits.get(CreditKind::Wht), dec!(0.75));
        assert_eq!(credits.total(), dec!(123.75));
    }

    #[test]
    fn balance_payable_never_negative() {
        let credits = TaxCredits {
            apit: dec!(500),
            ..Default::default()
        };
        assert_eq!(balance_payable(dec!(300), &credits), Decimal::ZERO);
        assert_eq!(balance_payable(dec!(800), &credits), dec!(300));
    }
}
