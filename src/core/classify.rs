//! Maps raw income/deduction records onto the taxonomy.
//!
//! Rules are data: an ordered table scanned first-match-wins over the
//! lowercased description (and type hint), so precedence can be read off
//! [`RULES`] and tested directly.

use super::entry::deserialize_amount;
use super::taxonomy::{Category, CategoryType, EntryKind, WhtSource};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A record as entered on a form or extracted from a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawRecord {
    #[serde(default)]
    pub description: String,
    /// Category hint, e.g. "Business Income"
    #[serde(default)]
    pub category: Option<String>,
    /// Type hint, e.g. "Dividend Income" or "APIT"
    #[serde(default, rename = "type")]
    pub type_hint: Option<String>,
    #[serde(deserialize_with = "deserialize_amount")]
    #[schemars(with = "f64")]
    pub amount: Decimal,
    /// Income when absent, unless an exact type hint names a deduction leaf
    #[serde(default)]
    pub kind: Option<EntryKind>,
}

impl RawRecord {
    pub fn new(description: &str, amount: Decimal) -> Self {
        RawRecord {
            description: description.to_string(),
            amount,
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_type(mut self, type_hint: &str) -> Self {
        self.type_hint = Some(type_hint.to_string());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Which step of the classifier decided the leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "id")]
pub enum MatchSource {
    CapitalGainsOverride,
    ExactHint,
    Keyword(&'static str),
    /// Generic leaf of the hinted category
    CategoryDefault,
    /// No hint and no keyword: Other Miscellaneous Income
    Fallback,
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSource::CapitalGainsOverride => write!(f, "capital-gains override"),
            MatchSource::ExactHint => write!(f, "exact hint"),
            MatchSource::Keyword(id) => write!(f, "keyword:{}", id),
            MatchSource::CategoryDefault => write!(f, "category default"),
            MatchSource::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub description: String,
    pub amount: Decimal,
    pub category: Category,
    pub category_type: CategoryType,
    pub kind: EntryKind,
    pub matched: MatchSource,
}

/// Keyword rule: every group must have at least one keyword present in the
/// text, and none of the `unless` keywords may be.
#[derive(Debug)]
pub struct Rule {
    pub id: &'static str,
    pub scope: Category,
    pub leaf: CategoryType,
    pub all_of: &'static [&'static [&'static str]],
    pub unless: &'static [&'static str],
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.all_of
            .iter()
            .all(|group| group.iter().any(|kw| text.contains(kw)))
            && !self.unless.iter().any(|kw| text.contains(kw))
    }

    pub fn kind(&self) -> EntryKind {
        self.leaf.kind()
    }
}

const CAPITAL_GAIN: &str = "capital gain";

const WHT: &[&str] = &["wht", "withholding"];

/// Ordered rule table. Within a scope the first matching rule wins.
pub static RULES: &[Rule] = &[
    // Deductions (tax credits)
    // "capital" contains "apit"
    Rule {
        id: "deduction.apit",
        scope: Category::Employment,
        leaf: CategoryType::ApitDeduction,
        all_of: &[&["apit"]],
        unless: &["capital"],
    },
    rule(
        "deduction.wht.service",
        Category::Other,
        CategoryType::Wht(WhtSource::Service),
        &[WHT, &["service"]],
    ),
    rule(
        "deduction.wht.royalty",
        Category::Other,
        CategoryType::Wht(WhtSource::Royalty),
        &[WHT, &["royalty"]],
    ),
    rule(
        "deduction.wht.natural-resource",
        Category::Other,
        CategoryType::Wht(WhtSource::NaturalResource),
        &[WHT, &["resource", "natural"]],
    ),
    rule(
        "deduction.wht.gem",
        Category::Other,
        CategoryType::Wht(WhtSource::GemSale),
        &[WHT, &["gem", "auction"]],
    ),
    rule(
        "deduction.wht.dividend",
        Category::Other,
        CategoryType::Wht(WhtSource::Dividend),
        &[WHT, &["dividend"]],
    ),
    rule(
        "deduction.wht.interest",
        Category::Other,
        CategoryType::Wht(WhtSource::Interest),
        &[WHT, &["interest"]],
    ),
    rule("deduction.wht", Category::Other, CategoryType::Wht(WhtSource::General), &[WHT]),
    rule(
        "deduction.ait",
        Category::Investment,
        CategoryType::AitDeduction,
        &[&["advance income tax", "ait"]],
    ),
    rule(
        "deduction.paid-tax",
        Category::Investment,
        CategoryType::PaidTax,
        &[&["paid tax", "tax paid"]],
    ),
    // Terminal benefits
    rule(
        "terminal.commuted-pension",
        Category::TerminalBenefits,
        CategoryType::CommutedPension,
        &[&["commuted", "pension"]],
    ),
    rule(
        "terminal.gratuity",
        Category::TerminalBenefits,
        CategoryType::RetiringGratuity,
        &[&["gratuity"]],
    ),
    rule(
        "terminal.compensation",
        Category::TerminalBenefits,
        CategoryType::CompensationForLossOfOffice,
        &[&["compensation", "loss of office"]],
    ),
    rule(
        "terminal.etf",
        Category::TerminalBenefits,
        CategoryType::EtfPayment,
        &[&["etf", "trust fund"]],
    ),
    // Qualifying payments
    rule(
        "qualifying.donation",
        Category::QualifyingPayments,
        CategoryType::Donations,
        &[&["donation", "charity", "charitable"]],
    ),
    rule(
        "qualifying.samurdhi",
        Category::QualifyingPayments,
        CategoryType::SamurdhiShopSetup,
        &[&["samurdhi", "samurthy"]],
    ),
    rule(
        "qualifying.solar",
        Category::QualifyingPayments,
        CategoryType::SolarInstallation,
        &[&["solar"]],
    ),
    rule(
        "qualifying.cinema",
        Category::QualifyingPayments,
        CategoryType::CinemaInvestment,
        &[&["cinema", "film"]],
    ),
    rule(
        "qualifying.housing",
        Category::QualifyingPayments,
        CategoryType::Housing,
        &[&["housing"]],
    ),
    // Employment
    rule(
        "employment.secondary",
        Category::Employment,
        CategoryType::SecondaryEmployment,
        &[&["secondary"]],
    ),
    rule(
        "employment.primary",
        Category::Employment,
        CategoryType::PrimaryEmployment,
        &[&["primary", "salary", "employment", "wage"]],
    ),
    // Business
    rule(
        "business.sole-proprietorship",
        Category::Business,
        CategoryType::SoleProprietorship,
        &[&["sole", "proprietorship"]],
    ),
    rule(
        "business.partnership",
        Category::Business,
        CategoryType::Partnership,
        &[&["partnership"]],
    ),
    Rule {
        id: "business.trust-beneficiary",
        scope: Category::Business,
        leaf: CategoryType::TrustBeneficiary,
        all_of: &[&["trust", "beneficiary"]],
        unless: &["samurdhi", "samurthy"],
    },
    rule(
        "business.betting-gaming",
        Category::Business,
        CategoryType::BettingGaming,
        &[&["betting", "gaming"]],
    ),
    // Investment
    rule(
        "investment.dividend",
        Category::Investment,
        CategoryType::DividendIncome,
        &[&["dividend"]],
    ),
    rule(
        "investment.rent",
        Category::Investment,
        CategoryType::RentalIncome,
        &[&["rent", "property"]],
    ),
    rule(
        "investment.interest",
        Category::Investment,
        CategoryType::InterestIncome,
        &[&["interest", "bank"]],
    ),
    // Other income
    rule(
        "other.service",
        Category::Other,
        CategoryType::ServiceIncome,
        &[&["service", "consulting"]],
    ),
    rule("other.royalty", Category::Other, CategoryType::RoyaltyIncome, &[&["royalty"]]),
    rule(
        "other.natural-resource",
        Category::Other,
        CategoryType::NaturalResourcePayment,
        &[&["resource", "natural"]],
    ),
    rule("other.gem", Category::Other, CategoryType::GemSale, &[&["gem", "jewelry"]]),
];

const fn rule(
    id: &'static str,
    scope: Category,
    leaf: CategoryType,
    all_of: &'static [&'static [&'static str]],
) -> Rule {
    Rule {
        id,
        scope,
        leaf,
        all_of,
        unless: &[],
    }
}

/// Category inference order for records with no category hint
const INFERENCE_ORDER: [Category; 6] = [
    Category::TerminalBenefits,
    Category::QualifyingPayments,
    Category::Employment,
    Category::Business,
    Category::Investment,
    Category::Other,
];

/// Classify a raw record. Total: every record resolves to exactly one leaf.
pub fn classify(record: &RawRecord) -> ClassifiedRecord {
    let description = record.description.to_lowercase();
    let type_hint = record.type_hint.as_deref().map(str::to_lowercase);
    let category_hint = record.category.as_deref().and_then(Category::from_hint);

    // Description first, then the type hint for extracted items whose
    // description is only a payer name.
    let text = match &type_hint {
        Some(hint) => format!("{} | {}", description, hint),
        None => description.clone(),
    };

    // The override only reclassifies income; a tax credit withheld on a
    // capital gain stays a deduction.
    let exact = exact_leaf(record);
    let is_deduction = match record.kind {
        Some(kind) => kind == EntryKind::Deduction,
        None => exact.is_some_and(|leaf| leaf.kind() == EntryKind::Deduction),
    };

    let (category, category_type, matched) = if !is_deduction && text.contains(CAPITAL_GAIN) {
        (
            Category::Investment,
            CategoryType::CapitalGains,
            MatchSource::CapitalGainsOverride,
        )
    } else if let Some(leaf) = exact {
        let category = match category_hint {
            Some(category) if leaf.belongs_to(category) => category,
            _ => leaf.home_category(),
        };
        (category, leaf, MatchSource::ExactHint)
    } else {
        let kind = record.kind.unwrap_or_default();
        match kind {
            EntryKind::Deduction => classify_deduction(&text, category_hint),
            EntryKind::Income => classify_income(&text, category_hint),
        }
    };

    log::debug!(
        "Classified '{}' as {} / {} ({})",
        record.description,
        category,
        category_type,
        matched
    );

    ClassifiedRecord {
        description: record.description.clone(),
        amount: record.amount,
        category,
        category_type,
        kind: category_type.kind(),
        matched,
    }
}

/// Type hint, then category hint, naming a leaf whose kind agrees with the
/// record's declared kind (if any)
fn exact_leaf(record: &RawRecord) -> Option<CategoryType> {
    [record.type_hint.as_deref(), record.category.as_deref()]
        .into_iter()
        .flatten()
        .filter_map(CategoryType::from_label)
        .find(|leaf| record.kind.is_none_or(|kind| leaf.kind() == kind))
}

fn classify_deduction(
    text: &str,
    category_hint: Option<Category>,
) -> (Category, CategoryType, MatchSource) {
    if let Some(rule) = first_match(text, EntryKind::Deduction, None) {
        let category = match category_hint {
            Some(category) if rule.leaf.belongs_to(category) => category,
            _ => rule.leaf.home_category(),
        };
        return (category, rule.leaf, MatchSource::Keyword(rule.id));
    }
    match category_hint.and_then(|c| c.default_deduction().map(|leaf| (c, leaf))) {
        Some((category, leaf)) => (category, leaf, MatchSource::CategoryDefault),
        None => (
            Category::Other,
            CategoryType::Wht(WhtSource::General),
            MatchSource::Fallback,
        ),
    }
}

fn classify_income(
    text: &str,
    category_hint: Option<Category>,
) -> (Category, CategoryType, MatchSource) {
    match category_hint {
        Some(category) => match first_match(text, EntryKind::Income, Some(category)) {
            Some(rule) => (category, rule.leaf, MatchSource::Keyword(rule.id)),
            None => (category, category.generic_leaf(), MatchSource::CategoryDefault),
        },
        None => INFERENCE_ORDER
            .iter()
            .find_map(|category| first_match(text, EntryKind::Income, Some(*category)))
            .map(|rule| (rule.scope, rule.leaf, MatchSource::Keyword(rule.id)))
            .unwrap_or((
                Category::Other,
                CategoryType::OtherMiscellaneous,
                MatchSource::Fallback,
            )),
    }
}

fn first_match(text: &str, kind: EntryKind, scope: Option<Category>) -> Option<&'static Rule> {
    RULES
        .iter()
        .filter(|rule| rule.kind() == kind)
        .filter(|rule| scope.is_none_or(|scope| rule.scope == scope))
        .find(|rule| rule.matches(text))
}
