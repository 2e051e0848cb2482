use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::ledger::Transaction;

/// Transactions sharing one calendar day, newest entries first.
#[derive(Debug, Clone)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub transactions: Vec<&'a Transaction>,
}

pub struct GroupingService;

impl GroupingService {
    /// Date descending, then creation time descending for same-day entries.
    pub fn sort_newest_first(transactions: &mut [&Transaction]) {
        transactions.sort_by(|a, b| newest_first(a, b));
    }

    pub fn by_day(transactions: &[Transaction]) -> Vec<DayGroup<'_>> {
        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        Self::sort_newest_first(&mut ordered);

        let mut groups: Vec<DayGroup<'_>> = Vec::new();
        for txn in ordered {
            match groups.last_mut() {
                Some(group) if group.date == txn.date => group.transactions.push(txn),
                _ => groups.push(DayGroup {
                    date: txn.date,
                    transactions: vec![txn],
                }),
            }
        }
        groups
    }

    /// Keyed by `(year, month)`; each bucket is sorted newest first.
    pub fn by_month(transactions: &[Transaction]) -> BTreeMap<(i32, u32), Vec<&Transaction>> {
        let mut months: BTreeMap<(i32, u32), Vec<&Transaction>> = BTreeMap::new();
        for txn in transactions {
            months
                .entry((txn.date.year(), txn.date.month()))
                .or_default()
                .push(txn);
        }
        for bucket in months.values_mut() {
            Self::sort_newest_first(bucket);
        }
        months
    }

    pub fn by_category(transactions: &[Transaction]) -> BTreeMap<String, Vec<&Transaction>> {
        let mut categories: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
        for txn in transactions {
            categories.entry(txn.category.clone()).or_default().push(txn);
        }
        categories
    }

    /// Transfers appear under both the source and the target account.
    pub fn by_account(transactions: &[Transaction]) -> HashMap<Uuid, Vec<&Transaction>> {
        let mut accounts: HashMap<Uuid, Vec<&Transaction>> = HashMap::new();
        for txn in transactions {
            accounts.entry(txn.account_id).or_default().push(txn);
            if let Some(target) = txn.target_account_id.filter(|id| *id != txn.account_id) {
                accounts.entry(target).or_default().push(txn);
            }
        }
        accounts
    }

    /// Splits into `(history, upcoming recurring)` relative to `today`.
    pub fn split_recurring(
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> (Vec<&Transaction>, Vec<&Transaction>) {
        transactions
            .iter()
            .partition(|txn| !(txn.is_recurring() && txn.date > today))
    }
}

fn newest_first(a: &Transaction, b: &Transaction) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
