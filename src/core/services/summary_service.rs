use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{Transaction, TransactionType};

use super::filter_service::DateRange;

/// Aggregated totals for one time window, in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_internal_transfers: Decimal,
    pub net_flow: Decimal,
    /// Future-dated recurring expenses inside the window.
    pub planned_amount: Decimal,
    pub currency: String,
    #[serde(skip)]
    pub range: Option<DateRange>,
}

impl Summary {
    fn empty(currency: &str, range: Option<DateRange>) -> Self {
        Self {
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            total_internal_transfers: Decimal::ZERO,
            net_flow: Decimal::ZERO,
            planned_amount: Decimal::ZERO,
            currency: currency.to_string(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryExpense {
    pub category: String,
    pub total: Decimal,
    /// Unnamed subcategory spending is not broken out.
    pub subcategories: BTreeMap<String, Decimal>,
}

/// Report builders. `base` maps a transaction to its amount in the base
/// currency so callers decide how conversion is cached.
pub struct SummaryService;

impl SummaryService {
    pub fn summarize<'a, I, F>(
        transactions: I,
        range: Option<DateRange>,
        today: NaiveDate,
        currency: &str,
        mut base: F,
    ) -> Summary
    where
        I: IntoIterator<Item = &'a Transaction>,
        F: FnMut(&Transaction) -> Decimal,
    {
        let mut summary = Summary::empty(currency, range);
        for txn in transactions {
            if range.is_some_and(|window| !window.contains(txn.date)) {
                continue;
            }
            let amount = base(txn);
            if txn.date > today {
                if txn.is_recurring() && txn.kind == TransactionType::Expense {
                    summary.planned_amount += amount;
                }
                continue;
            }
            match txn.kind {
                TransactionType::Income | TransactionType::DepositInterestAccrual => {
                    summary.total_income += amount
                }
                TransactionType::Expense => summary.total_expenses += amount,
                TransactionType::InternalTransfer => summary.total_internal_transfers += amount,
            }
        }
        summary.net_flow = summary.total_income - summary.total_expenses;
        summary
    }

    /// Expense totals per category, largest first; ties ordered by name.
    pub fn category_expenses<'a, I, F>(
        transactions: I,
        range: Option<DateRange>,
        today: NaiveDate,
        mut base: F,
    ) -> Vec<CategoryExpense>
    where
        I: IntoIterator<Item = &'a Transaction>,
        F: FnMut(&Transaction) -> Decimal,
    {
        let mut totals: BTreeMap<String, CategoryExpense> = BTreeMap::new();
        for txn in transactions {
            if txn.kind != TransactionType::Expense || txn.date > today {
                continue;
            }
            if range.is_some_and(|window| !window.contains(txn.date)) {
                continue;
            }
            let amount = base(txn);
            let entry = totals
                .entry(txn.category.clone())
                .or_insert_with(|| CategoryExpense {
                    category: txn.category.clone(),
                    total: Decimal::ZERO,
                    subcategories: BTreeMap::new(),
                });
            entry.total += amount;
            if let Some(sub) = txn.subcategory.as_deref().filter(|sub| !sub.is_empty()) {
                *entry.subcategories.entry(sub.to_string()).or_default() += amount;
            }
        }
        let mut expenses: Vec<CategoryExpense> = totals.into_values().collect();
        expenses.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });
        expenses
    }

    /// Sum of expenses dated exactly `date`.
    pub fn expenses_on<'a, I, F>(transactions: I, date: NaiveDate, base: F) -> Decimal
    where
        I: IntoIterator<Item = &'a Transaction>,
        F: FnMut(&Transaction) -> Decimal,
    {
        transactions
            .into_iter()
            .filter(|txn| txn.kind == TransactionType::Expense && txn.date == date)
            .map(base)
            .sum()
    }
}
