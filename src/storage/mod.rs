pub mod json_backend;
pub mod memory;

use crate::errors::Result;
use crate::ledger::{Account, Category, RecurringOccurrence, RecurringSeries, Settings, Transaction};

/// Whole-collection persistence. Every `save_*` replaces the stored collection.
pub trait Repository: Send + Sync {
    fn load_transactions(&self) -> Result<Vec<Transaction>>;
    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()>;

    fn load_accounts(&self) -> Result<Vec<Account>>;
    fn save_accounts(&self, accounts: &[Account]) -> Result<()>;

    fn load_categories(&self) -> Result<Vec<Category>>;
    fn save_categories(&self, categories: &[Category]) -> Result<()>;

    fn load_recurring_series(&self) -> Result<Vec<RecurringSeries>>;
    fn save_recurring_series(&self, series: &[RecurringSeries]) -> Result<()>;

    fn load_recurring_occurrences(&self) -> Result<Vec<RecurringOccurrence>>;
    fn save_recurring_occurrences(&self, occurrences: &[RecurringOccurrence]) -> Result<()>;

    fn load_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
}

pub use json_backend::JsonRepository;
pub use memory::InMemoryRepository;
