use super::classify::{classify, RawRecord};
use super::entry::{validate_amount, validate_description, Entry, EntryId, Provenance};
use super::error::EngineError;
use super::snapshot::{assess_with_rates, AggregateSnapshot};
use super::taxonomy::{Category, EntryKind};
use super::year::{RateTable, TaxYear, YearRates};
use rust_decimal::Decimal;

/// Linear undo/redo history. Never empty; `cursor` always indexes a state.
///
/// Growth is unbounded: a session keeps every state it has produced until
/// an edit after an undo truncates the redo branch.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    states: Vec<T>,
    cursor: usize,
}

impl<T> HistoryStack<T> {
    pub fn new(initial: T) -> Self {
        HistoryStack {
            states: vec![initial],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.states[self.cursor]
    }

    /// Drop any redo branch, push `next` and make it current
    pub fn apply(&mut self, next: T) -> &T {
        self.states.truncate(self.cursor + 1);
        self.states.push(next);
        self.cursor += 1;
        self.current()
    }

    /// Step back; returns false (and does nothing) at the initial state
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward; returns false (and does nothing) at the newest state
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of states held, including the initial one
    pub fn depth(&self) -> usize {
        self.states.len()
    }
}

/// Interactive editing over an assessment.
///
/// Every accepted edit rebuilds the entry set from the current snapshot,
/// applies the change and reruns the whole pipeline. A rejected edit leaves
/// the history untouched.
#[derive(Debug, Clone)]
pub struct EditSession {
    year: TaxYear,
    rates: YearRates,
    history: HistoryStack<AggregateSnapshot>,
    /// Ids are never reused, even after undo, so a stale id cannot name a
    /// newer entry.
    next_id: usize,
}

impl EditSession {
    pub fn new(entries: Vec<Entry>, year: TaxYear, table: &RateTable) -> Result<Self, EngineError> {
        let rates = table.rates(year)?.clone();
        let next_id = entries.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
        let initial = assess_with_rates(entries, year, &rates);
        Ok(EditSession {
            year,
            rates,
            history: HistoryStack::new(initial),
            next_id,
        })
    }

    pub fn current(&self) -> &AggregateSnapshot {
        self.history.current()
    }

    pub fn history(&self) -> &HistoryStack<AggregateSnapshot> {
        &self.history
    }

    pub fn tax_year(&self) -> TaxYear {
        self.year
    }

    /// Classify `record` within `category` and add it as a manual entry
    pub fn add_entry(
        &mut self,
        category: Category,
        kind: EntryKind,
        mut record: RawRecord,
    ) -> Result<(EntryId, &AggregateSnapshot), EngineError> {
        record.category = Some(category.label().to_string());
        record.kind = Some(kind);
        let classified = classify(&record);

        let id = EntryId(self.next_id);
        let entry = Entry::from_classified(id, &classified, Provenance::Manual)?;
        log::debug!("Adding {} '{}' under {}", id, entry.description, entry.category);

        let mut entries = self.current_entries();
        entries.push(entry);
        self.next_id += 1;
        Ok((id, self.commit(entries)))
    }

    pub fn update_entry_amount(
        &mut self,
        id: EntryId,
        amount: Decimal,
    ) -> Result<&AggregateSnapshot, EngineError> {
        let amount = validate_amount(amount)?;
        self.edit_entry(id, |entry| entry.amount = amount)
    }

    pub fn rename_entry(
        &mut self,
        id: EntryId,
        description: &str,
    ) -> Result<&AggregateSnapshot, EngineError> {
        let description = validate_description(description)?;
        self.edit_entry(id, |entry| entry.description = description)
    }

    pub fn delete_entry(&mut self, id: EntryId) -> Result<&AggregateSnapshot, EngineError> {
        let mut entries = self.current_entries();
        let index = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(EngineError::EntryNotFound(id))?;
        let removed = entries.remove(index);
        log::debug!("Deleting {} '{}'", id, removed.description);
        Ok(self.commit(entries))
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn edit_entry<F>(&mut self, id: EntryId, edit: F) -> Result<&AggregateSnapshot, EngineError>
    where
        F: FnOnce(&mut Entry),
    {
        let mut entries = self.current_entries();
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(EngineError::EntryNotFound(id))?;
        edit(entry);
        log::debug!("Edited {}", id);
        Ok(self.commit(entries))
    }

    fn current_entries(&self) -> Vec<Entry> {
        self.current().entries().cloned().collect()
    }

    fn commit(&mut self, entries: Vec<Entry>) -> &AggregateSnapshot {
        let snapshot = assess_with_rates(entries, self.year, &self.rates);
        self.history.apply(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::taxonomy::CategoryType;
    use rust_decimal_macros::dec;

    fn employment(id: usize, amount: Decimal) -> Entry {
        Entry {
            id: EntryId(id),
            description: "Salary".to_string(),
            amount,
            category: Category::Employment,
            category_type: CategoryType::PrimaryEmployment,
            kind: EntryKind::Income,
            provenance: Provenance::Extracted { document: None },
        }
    }

    fn session() -> EditSession {
        EditSession::new(
            vec![employment(0, dec!(2000000))],
            TaxYear(2025),
            &RateTable::builtin(),
        )
        .unwrap()
    }

    #[test]
    fn history_stack_transitions() {
        let mut stack = HistoryStack::new(0);
        assert!(!stack.undo());
        assert!(!stack.redo());
        stack.apply(1);
        stack.apply(2);
        assert_eq!(*stack.current(), 2);
        assert!(stack.undo());
        assert_eq!(*stack.current(), 1);
        assert!(stack.can_redo());
        // applying after undo truncates the redo branch
        stack.apply(3);
        assert_eq!(stack.depth(), 3);
        assert!(!stack.can_redo());
        assert!(stack.undo());
        assert!(stack.undo());
        assert!(!stack.undo());
        assert_eq!(*stack.current(), 0);
        assert_eq!(stack.cursor(), 0);
    }

    #[test]
    fn add_entry_classifies_within_category() {
        let mut session = session();
        let (id, snapshot) = session
            .add_entry(
                Category::Investment,
                EntryKind::Income,
                RawRecord::new("Rent from Kandy house", dec!(1000000)),
            )
            .unwrap();
        assert_eq!(id, EntryId(1));
        let entry = snapshot.summaries.entry(id).unwrap();
        assert_eq!(entry.category_type, CategoryType::RentalIncome);
        assert_eq!(entry.provenance, Provenance::Manual);
        assert_eq!(snapshot.reliefs.rental_relief, Some(dec!(225000)));
        assert!(session.can_undo());
    }

    #[test]
    fn added_capital_gains_credit_stays_a_deduction() {
        let mut session = session();
        let (id, snapshot) = session
            .add_entry(
                Category::Investment,
                EntryKind::Deduction,
                RawRecord::new("AIT on capital gains", dec!(40000)),
            )
            .unwrap();
        let entry = snapshot.summaries.entry(id).unwrap();
        assert_eq!(entry.kind, EntryKind::Deduction);
        assert_eq!(entry.category_type, CategoryType::AitDeduction);
        assert_eq!(snapshot.gross_income, dec!(2000000));
        assert_eq!(snapshot.tax_credits.ait, dec!(40000));
    }

    #[test]
    fn rejected_edits_leave_history_unchanged() {
        let mut session = session();
        let before = session.current().clone();

        assert_eq!(
            session
                .update_entry_amount(EntryId(0), dec!(-1))
                .unwrap_err(),
            EngineError::InvalidAmount("-1".to_string())
        );
        assert_eq!(
            session.rename_entry(EntryId(0), "  ").unwrap_err(),
            EngineError::EmptyDescription
        );
        assert_eq!(
            session.delete_entry(EntryId(42)).unwrap_err(),
            EngineError::EntryNotFound(EntryId(42))
        );
        assert_eq!(
            session
                .add_entry(
                    Category::Business,
                    EntryKind::Income,
                    RawRecord::new("", dec!(10))
                )
                .unwrap_err(),
            EngineError::EmptyDescription
        );
        assert_eq!(session.current(), &before);
        assert_eq!(session.history().depth(), 1);
    }

    #[test]
    fn stale_id_after_delete_is_not_found() {
        let mut session = session();
        session.delete_entry(EntryId(0)).unwrap();
        assert_eq!(
            session.update_entry_amount(EntryId(0), dec!(5)).unwrap_err(),
            EngineError::EntryNotFound(EntryId(0))
        );
    }

    #[test]
    fn ids_not_reused_after_undo() {
        let mut session = session();
        let (first, _) = session
            .add_entry(
                Category::Other,
                EntryKind::Income,
                RawRecord::new("Consulting", dec!(10)),
            )
            .unwrap();
        session.undo();
        let (second, _) = session
            .add_entry(
                Category::Other,
                EntryKind::Income,
                RawRecord::new("Royalty", dec!(10)),
            )
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn update_and_rename_recompute_everything() {
        let mut session = session();
        let snapshot = session.update_entry_amount(EntryId(0), dec!(2700000)).unwrap();
        assert_eq!(snapshot.taxable_income, dec!(1500000));
        assert_eq!(snapshot.tax_liability, dec!(180000));

        let snapshot = session.rename_entry(EntryId(0), "Salary - ABC PLC").unwrap();
        assert_eq!(
            snapshot.summaries.entry(EntryId(0)).unwrap().description,
            "Salary - ABC PLC"
        );
        assert_eq!(snapshot.tax_liability, dec!(180000));
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut session = session();
        let initial = session.current().clone();

        session
            .add_entry(
                Category::QualifyingPayments,
                EntryKind::Income,
                RawRecord::new("Solar panels", dec!(300000)),
            )
            .unwrap();
        session.update_entry_amount(EntryId(0), dec!(3500000)).unwrap();
        session.rename_entry(EntryId(1), "Rooftop solar").unwrap();
        session.delete_entry(EntryId(0)).unwrap();
        let last = session.current().clone();

        for _ in 0..4 {
            assert!(session.undo());
        }
        assert!(!session.undo());
        assert_eq!(session.current(), &initial);

        for _ in 0..4 {
            assert!(session.redo());
        }
        assert!(!session.redo());
        assert_eq!(session.current(), &last);
    }

    #[test]
    fn unknown_year_rejected_at_session_start() {
        let result = EditSession::new(Vec::new(), TaxYear(2020), &RateTable::builtin());
        assert!(matches!(result, Err(EngineError::UnknownTaxYear(_))));
    }
}
