//! Closed taxonomy of income categories, their leaf types and deduction types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level category. Declaration order is the canonical report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Category {
    Employment,
    Business,
    Investment,
    Other,
    QualifyingPayments,
    TerminalBenefits,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Employment,
        Category::Business,
        Category::Investment,
        Category::Other,
        Category::QualifyingPayments,
        Category::TerminalBenefits,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Employment => "Employment Income",
            Category::Business => "Business Income",
            Category::Investment => "Investment Income",
            Category::Other => "Other Income",
            Category::QualifyingPayments => "Qualifying Payments & Relief",
            Category::TerminalBenefits => "Terminal Benefits",
        }
    }

    /// Parse a category hint. Accepts the report label and the short names
    /// used by form state ("employment", "qualifying", ...).
    pub fn from_hint(hint: &str) -> Option<Category> {
        let hint = hint.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.label().to_lowercase() == hint)
            .or(match hint.as_str() {
                "employment" => Some(Category::Employment),
                "business" => Some(Category::Business),
                "investment" => Some(Category::Investment),
                "other" => Some(Category::Other),
                "qualifying" | "qualifying payments" | "qualifying payments and relief" => {
                    Some(Category::QualifyingPayments)
                }
                "terminal" | "terminal benefit" => Some(Category::TerminalBenefits),
                _ => None,
            })
    }

    /// Qualifying payments are reliefs: subtracted from income, never added.
    pub fn is_relief(self) -> bool {
        self == Category::QualifyingPayments
    }

    /// Leaf assigned to income records nothing more specific matched.
    pub fn generic_leaf(self) -> CategoryType {
        match self {
            Category::Employment => CategoryType::PrimaryEmployment,
            Category::Business => CategoryType::OtherBusiness,
            Category::Investment => CategoryType::OtherInvestment,
            Category::Other => CategoryType::OtherMiscellaneous,
            Category::QualifyingPayments => CategoryType::OtherQualifyingPayment,
            Category::TerminalBenefits => CategoryType::OtherTerminalBenefit,
        }
    }

    /// Deduction leaf for a deduction record scoped to this category, or
    /// `None` where the category carries no tax credits.
    pub fn default_deduction(self) -> Option<CategoryType> {
        match self {
            Category::Employment => Some(CategoryType::ApitDeduction),
            Category::Business | Category::Investment => Some(CategoryType::AitDeduction),
            Category::Other => Some(CategoryType::Wht(WhtSource::General)),
            Category::QualifyingPayments | Category::TerminalBenefits => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum EntryKind {
    #[default]
    Income,
    Deduction,
}

/// Source of income a withholding tax deduction was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum WhtSource {
    Service,
    Royalty,
    NaturalResource,
    GemSale,
    Dividend,
    Interest,
    General,
}

impl WhtSource {
    pub fn label(self) -> &'static str {
        match self {
            WhtSource::Service => "Service Income WHT",
            WhtSource::Royalty => "Royalty WHT",
            WhtSource::NaturalResource => "Natural Resource WHT",
            WhtSource::GemSale => "Gem Sale WHT",
            WhtSource::Dividend => "Dividend WHT",
            WhtSource::Interest => "Interest WHT",
            WhtSource::General => "WHT Deduction",
        }
    }
}

/// Tax credit bucket a deduction is credited against liability under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CreditKind {
    Apit,
    Ait,
    PaidTax,
    Wht,
}

impl CreditKind {
    pub fn label(self) -> &'static str {
        match self {
            CreditKind::Apit => "APIT (Advanced Personal Income Tax)",
            CreditKind::Ait => "AIT (Advance Income Tax)",
            CreditKind::PaidTax => "Paid Tax",
            CreditKind::Wht => "WHT (Withholding Tax)",
        }
    }
}

/// Leaf of the taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CategoryType {
    PrimaryEmployment,
    SecondaryEmployment,

    SoleProprietorship,
    Partnership,
    TrustBeneficiary,
    BettingGaming,
    OtherBusiness,

    InterestIncome,
    DividendIncome,
    RentalIncome,
    CapitalGains,
    OtherInvestment,

    ServiceIncome,
    RoyaltyIncome,
    NaturalResourcePayment,
    GemSale,
    OtherMiscellaneous,

    Donations,
    SamurdhiShopSetup,
    SolarInstallation,
    CinemaInvestment,
    Housing,
    OtherQualifyingPayment,

    CommutedPension,
    RetiringGratuity,
    CompensationForLossOfOffice,
    EtfPayment,
    OtherTerminalBenefit,

    ApitDeduction,
    AitDeduction,
    PaidTax,
    Wht(WhtSource),
}

impl CategoryType {
    pub const ALL: [CategoryType; 38] = [
        CategoryType::PrimaryEmployment,
        CategoryType::SecondaryEmployment,
        CategoryType::SoleProprietorship,
        CategoryType::Partnership,
        CategoryType::TrustBeneficiary,
        CategoryType::BettingGaming,
        CategoryType::OtherBusiness,
        CategoryType::InterestIncome,
        CategoryType::DividendIncome,
        CategoryType::RentalIncome,
        CategoryType::CapitalGains,
        CategoryType::OtherInvestment,
        CategoryType::ServiceIncome,
        CategoryType::RoyaltyIncome,
        CategoryType::NaturalResourcePayment,
        CategoryType::GemSale,
        CategoryType::OtherMiscellaneous,
        CategoryType::Donations,
        CategoryType::SamurdhiShopSetup,
        CategoryType::SolarInstallation,
        CategoryType::CinemaInvestment,
        CategoryType::Housing,
        CategoryType::OtherQualifyingPayment,
        CategoryType::CommutedPension,
        CategoryType::RetiringGratuity,
        CategoryType::CompensationForLossOfOffice,
        CategoryType::EtfPayment,
        CategoryType::OtherTerminalBenefit,
        CategoryType::ApitDeduction,
        CategoryType::AitDeduction,
        CategoryType::PaidTax,
        CategoryType::Wht(WhtSource::Service),
        CategoryType::Wht(WhtSource::Royalty),
        CategoryType::Wht(WhtSource::NaturalResource),
        CategoryType::Wht(WhtSource::GemSale),
        CategoryType::Wht(WhtSource::Dividend),
        CategoryType::Wht(WhtSource::Interest),
        CategoryType::Wht(WhtSource::General),
    ];

    pub fn label(self) -> &'static str {
        match self {
            CategoryType::PrimaryEmployment => "Primary Employment",
            CategoryType::SecondaryEmployment => "Secondary Employment",
            CategoryType::SoleProprietorship => "Sole Proprietorship",
            CategoryType::Partnership => "Partnership Business",
            CategoryType::TrustBeneficiary => "Trust Beneficiary",
            CategoryType::BettingGaming => "Betting & Gaming",
            CategoryType::OtherBusiness => "Other Business",
            CategoryType::InterestIncome => "Interest Income",
            CategoryType::DividendIncome => "Dividend Income",
            CategoryType::RentalIncome => "Rental Income",
            CategoryType::CapitalGains => "Capital Gains",
            CategoryType::OtherInvestment => "Other Investment",
            CategoryType::ServiceIncome => "Service Income",
            CategoryType::RoyaltyIncome => "Royalty Income",
            CategoryType::NaturalResourcePayment => "Natural Resource Payment",
            CategoryType::GemSale => "Gem Sale Income",
            CategoryType::OtherMiscellaneous => "Other Miscellaneous Income",
            CategoryType::Donations => "Donations",
            CategoryType::SamurdhiShopSetup => "Samurdhi Shop Setup",
            CategoryType::SolarInstallation => "Solar Installation",
            CategoryType::CinemaInvestment => "Cinema Industry Investment",
            CategoryType::Housing => "Housing",
            CategoryType::OtherQualifyingPayment => "Other Qualifying Payment",
            CategoryType::CommutedPension => "Commuted Pension",
            CategoryType::RetiringGratuity => "Retiring Gratuity",
            CategoryType::CompensationForLossOfOffice => "Compensation for Loss of Office",
            CategoryType::EtfPayment => "ETF Payment",
            CategoryType::OtherTerminalBenefit => "Other Terminal Benefits",
            CategoryType::ApitDeduction => "APIT Deduction",
            CategoryType::AitDeduction => "AIT Deduction",
            CategoryType::PaidTax => "Paid Tax",
            CategoryType::Wht(source) => source.label(),
        }
    }

    /// Exact (case-insensitive) lookup by leaf label, plus the extraction
    /// service's own type codes.
    pub fn from_label(label: &str) -> Option<CategoryType> {
        let label = label.trim().to_lowercase();
        CategoryType::ALL
            .into_iter()
            .find(|t| t.label().to_lowercase() == label)
            .or(match label.as_str() {
                "salary" => Some(CategoryType::PrimaryEmployment),
                "apit" => Some(CategoryType::ApitDeduction),
                "ait" => Some(CategoryType::AitDeduction),
                "wht" => Some(CategoryType::Wht(WhtSource::General)),
                _ => None,
            })
    }

    pub fn kind(self) -> EntryKind {
        match self {
            CategoryType::ApitDeduction
            | CategoryType::AitDeduction
            | CategoryType::PaidTax
            | CategoryType::Wht(_) => EntryKind::Deduction,
            _ => EntryKind::Income,
        }
    }

    /// Category a leaf belongs to when nothing else decides it.
    pub fn home_category(self) -> Category {
        use CategoryType::*;
        match self {
            PrimaryEmployment | SecondaryEmployment | ApitDeduction => Category::Employment,
            SoleProprietorship | Partnership | TrustBeneficiary | BettingGaming | OtherBusiness => {
                Category::Business
            }
            InterestIncome | DividendIncome | RentalIncome | CapitalGains | OtherInvestment
            | AitDeduction | PaidTax => Category::Investment,
            ServiceIncome | RoyaltyIncome | NaturalResourcePayment | GemSale
            | OtherMiscellaneous | Wht(_) => Category::Other,
            Donations | SamurdhiShopSetup | SolarInstallation | CinemaInvestment | Housing
            | OtherQualifyingPayment => Category::QualifyingPayments,
            CommutedPension | RetiringGratuity | CompensationForLossOfOffice | EtfPayment
            | OtherTerminalBenefit => Category::TerminalBenefits,
        }
    }

    /// Whether the leaf may be filed under `category`. AIT is credited under
    /// both business and investment income.
    pub fn belongs_to(self, category: Category) -> bool {
        match self {
            CategoryType::AitDeduction => {
                matches!(category, Category::Business | Category::Investment)
            }
            _ => self.home_category() == category,
        }
    }

    pub fn credit_kind(self) -> Option<CreditKind> {
        match self {
            CategoryType::ApitDeduction => Some(CreditKind::Apit),
            CategoryType::AitDeduction => Some(CreditKind::Ait),
            CategoryType::PaidTax => Some(CreditKind::PaidTax),
            CategoryType::Wht(_) => Some(CreditKind::Wht),
            _ => None,
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
