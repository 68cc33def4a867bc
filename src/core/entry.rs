use super::classify::ClassifiedRecord;
use super::error::EngineError;
use super::taxonomy::{Category, CategoryType, EntryKind};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Stable identity of an entry within one editing session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct EntryId(pub usize);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an entry came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source")]
pub enum Provenance {
    Manual,
    /// Produced by document analysis; `document` is the analysed document's type
    Extracted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document: Option<String>,
    },
}

impl Provenance {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Provenance::Extracted { .. })
    }
}

/// One income or deduction line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entry {
    pub id: EntryId,
    pub description: String,
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub category: Category,
    pub category_type: CategoryType,
    pub kind: EntryKind,
    pub provenance: Provenance,
}

impl Entry {
    /// Build an entry from a classified record.
    ///
    /// Amounts must be non-negative. A blank description is rejected for
    /// manual entries; extracted entries are named after their leaf instead,
    /// since documents frequently omit a line description.
    pub fn from_classified(
        id: EntryId,
        record: &ClassifiedRecord,
        provenance: Provenance,
    ) -> Result<Self, EngineError> {
        let amount = validate_amount(record.amount)?;
        let description = match validate_description(&record.description) {
            Ok(description) => description,
            Err(_) if provenance.is_extracted() => record.category_type.label().to_string(),
            Err(err) => return Err(err),
        };
        Ok(Entry {
            id,
            description,
            amount,
            category: record.category,
            category_type: record.category_type,
            kind: record.kind,
            provenance,
        })
    }
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, EngineError> {
    if amount < Decimal::ZERO {
        return Err(EngineError::InvalidAmount(amount.to_string()));
    }
    Ok(amount)
}

pub fn validate_description(description: &str) -> Result<String, EngineError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(EngineError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Parse a user-supplied amount such as "1,250,000.00" or "Rs. 75,000".
/// Sign is preserved; range checks are [`validate_amount`]'s job.
pub fn parse_amount(s: &str) -> Result<Decimal, EngineError> {
    let cleaned: String = s
        .trim()
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .trim_start_matches("LKR")
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    Decimal::from_str(&cleaned).map_err(|_| EngineError::InvalidAmount(s.trim().to_string()))
}

/// Accept an amount as a JSON/CSV number or as a formatted string
pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    struct AmountVisitor;

    impl serde::de::Visitor<'_> for AmountVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Decimal, E> {
            parse_amount(&v.to_string()).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Decimal, E> {
            parse_amount(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classify::MatchSource;
    use rust_decimal_macros::dec;

    fn classified(description: &str, amount: Decimal) -> ClassifiedRecord {
        ClassifiedRecord {
            description: description.to_string(),
            amount,
            category: Category::Investment,
            category_type: CategoryType::DividendIncome,
            kind: EntryKind::Income,
            matched: MatchSource::CategoryDefault,
        }
    }

    #[test]
    fn parse_formatted_amounts() {
        assert_eq!(parse_amount("1,250,000.00").unwrap(), dec!(1250000.00));
        assert_eq!(parse_amount("Rs. 75,000").unwrap(), dec!(75000));
        assert_eq!(parse_amount(" 42 ").unwrap(), dec!(42));
        assert_eq!(parse_amount("-5").unwrap(), dec!(-5));
        assert_eq!(
            parse_amount("twelve"),
            Err(EngineError::InvalidAmount("twelve".to_string()))
        );
    }

    #[test]
    fn negative_amount_rejected() {
        assert_eq!(
            validate_amount(dec!(-0.01)),
            Err(EngineError::InvalidAmount("-0.01".to_string()))
        );
        assert_eq!(validate_amount(Decimal::ZERO), Ok(Decimal::ZERO));
    }

    #[test]
    fn manual_entry_requires_description() {
        let record = classified("   ", dec!(100));
        assert_eq!(
            Entry::from_classified(EntryId(0), &record, Provenance::Manual),
            Err(EngineError::EmptyDescription)
        );
    }

    #[test]
    fn extracted_entry_defaults_description_to_leaf_label() {
        let record = classified("", dec!(100));
        let entry = Entry::from_classified(
            EntryId(3),
            &record,
            Provenance::Extracted {
                document: Some("Bank Statement".to_string()),
            },
        )
        .unwrap();
        assert_eq!(entry.description, "Dividend Income");
        assert_eq!(entry.id, EntryId(3));
    }

    #[test]
    fn description_is_trimmed() {
        let record = classified("  Dividends from ABC  ", dec!(100));
        let entry = Entry::from_classified(EntryId(0), &record, Provenance::Manual).unwrap();
        assert_eq!(entry.description, "Dividends from ABC");
    }

    #[test]
    fn amount_accepts_numbers_and_strings() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(deserialize_with = "deserialize_amount")]
            amount: Decimal,
        }
        let row: Row = serde_json::from_str(r#"{"amount": 1500000}"#).unwrap();
        assert_eq!(row.amount, dec!(1500000));
        let row: Row = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(row.amount, dec!(12.5));
        let row: Row = serde_json::from_str(r#"{"amount": "1,200.50"}"#).unwrap();
        assert_eq!(row.amount, dec!(1200.50));
        assert!(serde_json::from_str::<Row>(r#"{"amount": "n/a"}"#).is_err());
    }
}
