use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::utils::dates::format_date;

pub const SUMMARY: &str = "summary";
pub const CATEGORY_EXPENSES: &str = "category-expenses";
pub const DAILY_EXPENSES: &str = "daily-expenses";
pub const BALANCES: &str = "balances";
pub const CONVERSIONS: &str = "conversions";

/// Namespaced key for a memoized derived value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Keyed by the resolved date-range label of the filter.
    Summary(String),
    CategoryExpenses(String),
    DailyExpenses(NaiveDate),
    Balance(Uuid),
    Conversion {
        amount: Decimal,
        from: String,
        to: String,
    },
}

impl CacheKey {
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKey::Summary(_) => SUMMARY,
            CacheKey::CategoryExpenses(_) => CATEGORY_EXPENSES,
            CacheKey::DailyExpenses(_) => DAILY_EXPENSES,
            CacheKey::Balance(_) => BALANCES,
            CacheKey::Conversion { .. } => CONVERSIONS,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Summary(range) | CacheKey::CategoryExpenses(range) => {
                write!(f, "{}:{}", self.namespace(), range)
            }
            CacheKey::DailyExpenses(date) => {
                write!(f, "{}:{}", self.namespace(), format_date(*date))
            }
            CacheKey::Balance(id) => write!(f, "{}:{}", self.namespace(), id),
            CacheKey::Conversion { amount, from, to } => {
                write!(f, "{}:{}:{}:{}", self.namespace(), from, to, amount)
            }
        }
    }
}

/// Coarse invalidation groups. A mutation invalidates whole groups rather than
/// tracking which entities each cached value read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationGroup {
    TimeFiltered,
    CategoryRelated,
    Balances,
}

impl InvalidationGroup {
    pub const ALL: [InvalidationGroup; 3] = [
        InvalidationGroup::TimeFiltered,
        InvalidationGroup::CategoryRelated,
        InvalidationGroup::Balances,
    ];

    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            InvalidationGroup::TimeFiltered => &[SUMMARY, DAILY_EXPENSES, CATEGORY_EXPENSES],
            InvalidationGroup::CategoryRelated => &[CATEGORY_EXPENSES, SUMMARY],
            InvalidationGroup::Balances => &[BALANCES],
        }
    }
}
