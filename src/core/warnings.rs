use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Domain warning types emitted during ingestion/assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Record matched no rule and no category hint; filed as
    /// Other Miscellaneous Income and may need manual review.
    UnclassifiedRecord { description: String },
    /// Document states an assessable total that its income items don't add up to.
    DocumentTotalMismatch {
        document_type: String,
        #[schemars(with = "f64")]
        stated: Decimal,
        #[schemars(with = "f64")]
        items: Decimal,
    },
    /// Donations above the statutory ceiling. Still deducted as entered.
    DonationCapExceeded {
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        cap: Decimal,
    },
    /// Solar installation above the statutory ceiling. Still deducted as entered.
    SolarCapExceeded {
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        cap: Decimal,
    },
}

impl Warning {
    pub fn name(&self) -> &'static str {
        match self {
            Warning::UnclassifiedRecord { .. } => "Unclassified",
            Warning::DocumentTotalMismatch { .. } => "DocumentTotalMismatch",
            Warning::DonationCapExceeded { .. } => "DonationCap",
            Warning::SolarCapExceeded { .. } => "SolarCap",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::UnclassifiedRecord { description } => format!(
                "'{}' matched no category rule - filed as Other Miscellaneous Income",
                description
            ),
            Warning::DocumentTotalMismatch {
                document_type,
                stated,
                items,
            } => format!(
                "{} states assessable income {:.2} but its items sum to {:.2}",
                document_type, stated, items
            ),
            Warning::DonationCapExceeded { claimed, cap } => format!(
                "Donations of {:.2} exceed the allowable {:.2} - deducted as entered",
                claimed, cap
            ),
            Warning::SolarCapExceeded { claimed, cap } => format!(
                "Solar installation of {:.2} exceeds the allowable {:.2} - deducted as entered",
                claimed, cap
            ),
        }
    }
}
