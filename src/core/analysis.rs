use super::classify::{classify, ClassifiedRecord, MatchSource, RawRecord};
use super::entry::{Entry, EntryId, Provenance};
use super::error::EngineError;
use super::taxonomy::EntryKind;
use super::warnings::Warning;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Input file: manually entered records plus document-analysis output
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaxInput {
    #[serde(default)]
    pub records: Vec<RawRecord>,
    #[serde(default)]
    pub documents: Vec<DocumentAnalysis>,
}

/// Structured output of the external document-analysis service for one document
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentAnalysis {
    pub document_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub income_items: Vec<RawRecord>,
    #[serde(default)]
    pub deductions: Vec<RawRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub total_assessable_income: Option<Decimal>,
}

impl DocumentAnalysis {
    pub fn items_total(&self) -> Decimal {
        self.income_items.iter().map(|r| r.amount).sum()
    }
}

/// Read the JSON input format
pub fn read_input_json<R: Read>(reader: R) -> anyhow::Result<TaxInput> {
    let input: TaxInput = serde_json::from_reader(reader)?;
    Ok(input)
}

/// Read manual records from CSV (`description,category,type,amount,kind`)
pub fn read_records_csv<R: Read>(reader: R) -> anyhow::Result<TaxInput> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        records.push(record);
    }
    Ok(TaxInput {
        records,
        documents: Vec::new(),
    })
}

/// Classified input ready for assessment
#[derive(Debug, Clone)]
pub struct Ingest {
    pub entries: Vec<Entry>,
    pub classified: Vec<ClassifiedRecord>,
    pub warnings: Vec<Warning>,
}

/// Classify every record and turn it into an entry.
///
/// Document items are consumed verbatim: income items become income and
/// deductions become deductions whatever the item says. Ids are assigned in
/// input order, manual records first.
pub fn ingest(input: &TaxInput) -> Result<Ingest, EngineError> {
    let mut ingest = Ingest {
        entries: Vec::new(),
        classified: Vec::new(),
        warnings: Vec::new(),
    };

    for record in &input.records {
        ingest.push(record, Provenance::Manual)?;
    }

    for document in &input.documents {
        let provenance = Provenance::Extracted {
            document: Some(document.document_type.clone()),
        };
        let items = document
            .income_items
            .iter()
            .map(|r| (r, EntryKind::Income))
            .chain(document.deductions.iter().map(|r| (r, EntryKind::Deduction)));
        for (item, kind) in items {
            let record = RawRecord {
                kind: Some(kind),
                ..item.clone()
            };
            ingest.push(&record, provenance.clone())?;
        }

        if let Some(stated) = document.total_assessable_income {
            let items = document.items_total();
            if stated != items {
                log::warn!(
                    "{}: stated assessable income {:.2} differs from item total {:.2}",
                    document.document_type,
                    stated,
                    items
                );
                ingest.warnings.push(Warning::DocumentTotalMismatch {
                    document_type: document.document_type.clone(),
                    stated,
                    items,
                });
            }
        }
    }

    log::info!(
        "Ingested {} entries ({} records, {} documents)",
        ingest.entries.len(),
        input.records.len(),
        input.documents.len()
    );
    Ok(ingest)
}

impl Ingest {
    fn push(&mut self, record: &RawRecord, provenance: Provenance) -> Result<(), EngineError> {
        let classified = classify(record);
        let entry = Entry::from_classified(EntryId(self.entries.len()), &classified, provenance)?;
        if classified.matched == MatchSource::Fallback && entry.kind == EntryKind::Income {
            self.warnings.push(Warning::UnclassifiedRecord {
                description: entry.description.clone(),
            });
        }
        self.entries.push(entry);
        self.classified.push(classified);
        Ok(())
    }
}
