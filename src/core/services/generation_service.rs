//! Expansion of recurring series into dated transactions, and demotion of
//! past-due recurring entries to plain history.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::{
    frequency::shift_month, Account, RecurringOccurrence, RecurringSeries, Transaction,
};
use crate::utils::dates::format_date;

/// Longest horizon honored; larger requests are clamped.
pub const MAX_HORIZON_MONTHS: u32 = 1200;

/// Namespace for ids derived from `(series, date)`.
const GENERATED_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_2c3a_9b84_4e57_a0c2_5d7e_31f8_b946);

/// Transactions and occurrences created by one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationDelta {
    pub transactions: Vec<Transaction>,
    pub occurrences: Vec<RecurringOccurrence>,
}

impl GenerationDelta {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.occurrences.is_empty()
    }
}

/// Deterministic id of the transaction generated for `series_id` on `date`.
pub fn generated_transaction_id(series_id: Uuid, date: NaiveDate) -> Uuid {
    let name = format!("transaction:{}:{}", series_id, format_date(date));
    Uuid::new_v5(&GENERATED_ID_NAMESPACE, name.as_bytes())
}

/// Deterministic id of the occurrence binding `series_id` to `date`.
pub fn generated_occurrence_id(series_id: Uuid, date: NaiveDate) -> Uuid {
    let name = format!("occurrence:{}:{}", series_id, format_date(date));
    Uuid::new_v5(&GENERATED_ID_NAMESPACE, name.as_bytes())
}

/// Pure generator anchored on a single "today".
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceGenerator {
    today: NaiveDate,
}

impl RecurrenceGenerator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn horizon_end(&self, horizon_months: u32) -> NaiveDate {
        let months = horizon_months.min(MAX_HORIZON_MONTHS);
        if months < horizon_months {
            tracing::warn!(requested = horizon_months, months, "generation horizon clamped");
        }
        shift_month(self.today, months as i32)
    }

    /// Materializes every scheduled date of each active series up to
    /// `today + horizon_months` that has no occurrence yet. Dates on or before
    /// a series' `regenerated_on` day are skipped.
    ///
    /// The occurrence table is the authoritative dedup key. Transaction ids are
    /// derived from `(series, date)`, so an id already present in
    /// `existing_transaction_ids` is never produced twice; in that case only
    /// the missing occurrence is emitted.
    pub fn generate(
        &self,
        series: &[RecurringSeries],
        existing_occurrences: &[RecurringOccurrence],
        existing_transaction_ids: &HashSet<Uuid>,
        accounts: &[Account],
        horizon_months: u32,
    ) -> GenerationDelta {
        let mut delta = GenerationDelta::default();
        if horizon_months == 0 {
            return delta;
        }
        let until = self.horizon_end(horizon_months);
        let mut seen: HashSet<(Uuid, String)> = existing_occurrences
            .iter()
            .map(|occurrence| (occurrence.series_id, occurrence.occurrence_date.clone()))
            .collect();

        for template in series.iter().filter(|candidate| candidate.is_active) {
            let Some(account_id) = resolve_account(template, accounts) else {
                tracing::warn!(series = %template.id, "no account available, skipping generation");
                continue;
            };
            let floor = template.regenerated_on();
            for date in template.scheduled_dates(until) {
                if floor.is_some_and(|floor| date <= floor) {
                    continue;
                }
                if !seen.insert((template.id, format_date(date))) {
                    continue;
                }
                let transaction_id = generated_transaction_id(template.id, date);
                let occurrence = RecurringOccurrence {
                    id: generated_occurrence_id(template.id, date),
                    ..RecurringOccurrence::new(template.id, date, transaction_id)
                };
                if !existing_transaction_ids.contains(&transaction_id) {
                    delta
                        .transactions
                        .push(materialize(template, &occurrence, date, account_id));
                }
                delta.occurrences.push(occurrence);
            }
        }

        tracing::debug!(
            transactions = delta.transactions.len(),
            occurrences = delta.occurrences.len(),
            until = %until,
            "generated recurring delta"
        );
        delta
    }

    /// Clears the recurring link of every entry dated on or before today.
    ///
    /// Entries of series that are known and inactive keep their link; entries
    /// of unknown series are treated as orphans and demoted.
    ///
    /// Occurrences of demoted entries are kept. They are what stops the next
    /// pass from regenerating that date, so the occurrence table grows with
    /// the series' history.
    pub fn convert_past_recurring_to_regular(
        &self,
        transactions: &[Transaction],
        series: &[RecurringSeries],
    ) -> Vec<Transaction> {
        let activity: HashMap<Uuid, bool> = series
            .iter()
            .map(|candidate| (candidate.id, candidate.is_active))
            .collect();
        transactions
            .iter()
            .map(|txn| {
                let mut txn = txn.clone();
                if let Some(series_id) = txn.recurring_series_id {
                    let active = activity.get(&series_id).copied().unwrap_or(true);
                    if active && txn.date <= self.today {
                        txn.clear_recurring_link();
                    }
                }
                txn
            })
            .collect()
    }
}

/// Number of positions where the recurring link differs between two snapshots.
pub fn count_link_changes(before: &[Transaction], after: &[Transaction]) -> usize {
    before
        .iter()
        .zip(after)
        .filter(|(old, new)| old.recurring_series_id != new.recurring_series_id)
        .count()
}

fn resolve_account(series: &RecurringSeries, accounts: &[Account]) -> Option<Uuid> {
    if let Some(id) = series.account_id {
        if accounts.iter().any(|account| account.id == id) {
            return Some(id);
        }
    }
    accounts
        .iter()
        .find(|account| account.currency.eq_ignore_ascii_case(&series.currency))
        .or_else(|| accounts.first())
        .map(|account| account.id)
}

fn materialize(
    series: &RecurringSeries,
    occurrence: &RecurringOccurrence,
    date: NaiveDate,
    account_id: Uuid,
) -> Transaction {
    let mut txn = Transaction::new(
        series.kind,
        account_id,
        date,
        series.amount,
        series.currency.clone(),
    )
    .with_category(series.category.clone(), series.subcategory.clone())
    .with_description(series.description.clone());
    txn.id = occurrence.transaction_id;
    txn.recurring_series_id = Some(series.id);
    txn.recurring_occurrence_id = Some(occurrence.id);
    txn
}
