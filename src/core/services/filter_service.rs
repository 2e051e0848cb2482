use chrono::{Datelike, Duration, NaiveDate};
use uuid::Uuid;

use crate::ledger::{frequency::shift_month, Transaction, TransactionType};
use crate::utils::dates::format_date;

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn label(&self) -> String {
        format!("{}..{}", format_date(self.start), format_date(self.end))
    }
}

/// Named time windows resolved against a reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeFilter {
    AllTime,
    Today,
    ThisWeek,
    ThisMonth,
    LastMonth,
    ThisYear,
    Last30Days,
    Custom(DateRange),
}

impl TimeFilter {
    /// Concrete range for `today`; `None` means unbounded.
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            TimeFilter::AllTime => None,
            TimeFilter::Today => Some(DateRange {
                start: today,
                end: today,
            }),
            TimeFilter::ThisWeek => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                Some(DateRange {
                    start,
                    end: start + Duration::days(6),
                })
            }
            TimeFilter::ThisMonth => Some(month_of(today)),
            TimeFilter::LastMonth => Some(month_of(shift_month(today, -1))),
            TimeFilter::ThisYear => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1)?;
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31)?;
                Some(DateRange { start, end })
            }
            TimeFilter::Last30Days => Some(DateRange {
                start: today - Duration::days(29),
                end: today,
            }),
            TimeFilter::Custom(range) => Some(*range),
        }
    }

    /// Stable component for cache keys; includes the resolved dates so a day
    /// rollover yields a different key.
    pub fn cache_label(&self, today: NaiveDate) -> String {
        match self.resolve(today) {
            Some(range) => range.label(),
            None => "all".into(),
        }
    }
}

fn month_of(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).unwrap_or(date);
    let end = shift_month(start, 1) - Duration::days(1);
    DateRange { start, end }
}

/// Partitioning of transaction collections; every function preserves input order.
pub struct FilterService;

impl FilterService {
    pub fn by_time<'a>(
        transactions: &'a [Transaction],
        filter: &TimeFilter,
        today: NaiveDate,
    ) -> Vec<&'a Transaction> {
        match filter.resolve(today) {
            Some(range) => Self::in_range(transactions, &range),
            None => transactions.iter().collect(),
        }
    }

    pub fn in_range<'a>(
        transactions: &'a [Transaction],
        range: &DateRange,
    ) -> Vec<&'a Transaction> {
        transactions
            .iter()
            .filter(|txn| range.contains(txn.date))
            .collect()
    }

    /// Case-insensitive category match; an empty selection keeps everything.
    pub fn by_categories<'a>(
        transactions: &'a [Transaction],
        categories: &[String],
    ) -> Vec<&'a Transaction> {
        if categories.is_empty() {
            return transactions.iter().collect();
        }
        transactions
            .iter()
            .filter(|txn| {
                categories
                    .iter()
                    .any(|name| name.trim().eq_ignore_ascii_case(txn.category.trim()))
            })
            .collect()
    }

    /// Entries touching the account on either leg.
    pub fn by_account(transactions: &[Transaction], account_id: Uuid) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|txn| txn.touches_account(account_id))
            .collect()
    }

    pub fn by_type(transactions: &[Transaction], kind: TransactionType) -> Vec<&Transaction> {
        transactions.iter().filter(|txn| txn.kind == kind).collect()
    }

    pub fn recurring(transactions: &[Transaction]) -> Vec<&Transaction> {
        transactions.iter().filter(|txn| txn.is_recurring()).collect()
    }

    pub fn non_recurring(transactions: &[Transaction]) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|txn| !txn.is_recurring())
            .collect()
    }

    /// Recurring entries dated strictly after today.
    pub fn upcoming_recurring(transactions: &[Transaction], today: NaiveDate) -> Vec<&Transaction> {
        transactions
            .iter()
            .filter(|txn| txn.is_recurring() && txn.date > today)
            .collect()
    }

    /// Substring search over description, category and subcategory.
    pub fn search<'a>(transactions: &'a [Transaction], query: &str) -> Vec<&'a Transaction> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return transactions.iter().collect();
        }
        transactions
            .iter()
            .filter(|txn| {
                txn.description.to_lowercase().contains(&needle)
                    || txn.category.to_lowercase().contains(&needle)
                    || txn
                        .subcategory
                        .as_deref()
                        .is_some_and(|sub| sub.to_lowercase().contains(&needle))
            })
            .collect()
    }
}
