use super::entry::{Entry, EntryId};
use super::taxonomy::{Category, CategoryType, EntryKind};
use rust_decimal::Decimal;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Income entries and tax-credit deductions filed under one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: Category,
    pub entries: Vec<Entry>,
    pub deductions: Vec<Entry>,
}

impl CategorySummary {
    fn new(category: Category) -> Self {
        CategorySummary {
            category,
            entries: Vec::new(),
            deductions: Vec::new(),
        }
    }

    /// Sum of income entry amounts. Always derived from `entries`.
    pub fn subtotal(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }

    pub fn deduction_total(&self) -> Decimal {
        self.deductions.iter().map(|e| e.amount).sum()
    }

    /// Total of income entries of one leaf type
    pub fn total_of(&self, leaf: CategoryType) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.category_type == leaf)
            .map(|e| e.amount)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.deductions.is_empty()
    }

    fn push(&mut self, entry: Entry) {
        match entry.kind {
            EntryKind::Income => self.entries.push(entry),
            EntryKind::Deduction => self.deductions.push(entry),
        }
    }
}

impl Serialize for CategorySummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CategorySummary", 5)?;
        state.serialize_field("category", &self.category)?;
        state.serialize_field("label", self.category.label())?;
        state.serialize_field("entries", &self.entries)?;
        state.serialize_field("subtotal", &self.subtotal())?;
        state.serialize_field("deductions", &self.deductions)?;
        state.end()
    }
}

/// Per-category summaries. All six categories are always present; empty
/// ones are only hidden from the visible view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    summaries: BTreeMap<Category, CategorySummary>,
}

/// Group entries by category, income and deductions kept apart, each in
/// input order.
pub fn aggregate<I>(entries: I) -> Aggregate
where
    I: IntoIterator<Item = Entry>,
{
    let mut summaries: BTreeMap<Category, CategorySummary> = Category::ALL
        .into_iter()
        .map(|c| (c, CategorySummary::new(c)))
        .collect();

    for entry in entries {
        summaries
            .entry(entry.category)
            .or_insert_with(|| CategorySummary::new(entry.category))
            .push(entry);
    }

    Aggregate { summaries }
}

impl Aggregate {
    pub fn summary(&self, category: Category) -> Option<&CategorySummary> {
        self.summaries.get(&category)
    }

    /// All summaries in canonical order, including empty ones
    pub fn summaries(&self) -> impl Iterator<Item = &CategorySummary> {
        self.summaries.values()
    }

    /// Summaries with at least one entry or a non-zero subtotal
    pub fn visible(&self) -> impl Iterator<Item = &CategorySummary> {
        self.summaries
            .values()
            .filter(|s| !s.is_empty() || !s.subtotal().is_zero())
    }

    pub fn subtotal(&self, category: Category) -> Decimal {
        self.summary(category)
            .map(CategorySummary::subtotal)
            .unwrap_or_default()
    }

    /// Total of income entries of one leaf type across the aggregate
    pub fn total_of(&self, leaf: CategoryType) -> Decimal {
        self.summaries().map(|s| s.total_of(leaf)).sum()
    }

    /// Every entry, income before deductions within each category
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.summaries()
            .flat_map(|s| s.entries.iter().chain(s.deductions.iter()))
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries().find(|e| e.id == id)
    }

    /// Employment, business, investment, other and terminal-benefit income
    pub fn gross_income(&self) -> Decimal {
        self.summaries()
            .filter(|s| !s.category.is_relief())
            .map(CategorySummary::subtotal)
            .sum()
    }

    pub fn qualifying_payments(&self) -> Decimal {
        self.subtotal(Category::QualifyingPayments)
    }

    /// Gross income less qualifying payments, floored at zero
    pub fn assessable_income(&self) -> Decimal {
        (self.gross_income() - self.qualifying_payments()).max(Decimal::ZERO)
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible: Vec<&CategorySummary> = self.visible().collect();
        let mut seq = serializer.serialize_seq(Some(visible.len()))?;
        for summary in visible {
            seq.serialize_element(summary)?;
        }
        seq.end()
    }
}
