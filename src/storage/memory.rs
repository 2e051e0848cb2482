use std::sync::{Mutex, MutexGuard};

use crate::{
    errors::{CoreError, Result},
    ledger::{Account, Category, RecurringOccurrence, RecurringSeries, Settings, Transaction},
};

use super::Repository;

#[derive(Debug, Default)]
struct Collections {
    transactions: Vec<Transaction>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    series: Vec<RecurringSeries>,
    occurrences: Vec<RecurringOccurrence>,
    settings: Settings,
}

/// Number of `save_*` calls per collection since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveCounts {
    pub transactions: usize,
    pub accounts: usize,
    pub categories: usize,
    pub series: usize,
    pub occurrences: usize,
    pub settings: usize,
}

/// Process-local repository for embedding and tests.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    collections: Mutex<Collections>,
    saves: Mutex<SaveCounts>,
    /// Sequence of collection names in save order.
    journal: Mutex<Vec<&'static str>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(self, accounts: Vec<Account>) -> Self {
        if let Ok(mut collections) = self.collections.lock() {
            collections.accounts = accounts;
        }
        self
    }

    pub fn with_categories(self, categories: Vec<Category>) -> Self {
        if let Ok(mut collections) = self.collections.lock() {
            collections.categories = categories;
        }
        self
    }

    pub fn with_settings(self, settings: Settings) -> Self {
        if let Ok(mut collections) = self.collections.lock() {
            collections.settings = settings;
        }
        self
    }

    pub fn save_counts(&self) -> SaveCounts {
        self.saves.lock().map(|counts| *counts).unwrap_or_default()
    }

    pub fn save_journal(&self) -> Vec<&'static str> {
        self.journal
            .lock()
            .map(|journal| journal.clone())
            .unwrap_or_default()
    }

    fn collections(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| CoreError::Storage("in-memory repository lock poisoned".into()))
    }

    fn record(&self, name: &'static str, bump: impl FnOnce(&mut SaveCounts)) -> Result<()> {
        let mut saves = self
            .saves
            .lock()
            .map_err(|_| CoreError::Storage("save counter lock poisoned".into()))?;
        bump(&mut saves);
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(name);
        }
        Ok(())
    }
}

impl Repository for InMemoryRepository {
    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.collections()?.transactions.clone())
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.collections()?.transactions = transactions.to_vec();
        self.record("transactions", |c| c.transactions += 1)
    }

    fn load_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.collections()?.accounts.clone())
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        self.collections()?.accounts = accounts.to_vec();
        self.record("accounts", |c| c.accounts += 1)
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        Ok(self.collections()?.categories.clone())
    }

    fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.collections()?.categories = categories.to_vec();
        self.record("categories", |c| c.categories += 1)
    }

    fn load_recurring_series(&self) -> Result<Vec<RecurringSeries>> {
        Ok(self.collections()?.series.clone())
    }

    fn save_recurring_series(&self, series: &[RecurringSeries]) -> Result<()> {
        self.collections()?.series = series.to_vec();
        self.record("recurring_series", |c| c.series += 1)
    }

    fn load_recurring_occurrences(&self) -> Result<Vec<RecurringOccurrence>> {
        Ok(self.collections()?.occurrences.clone())
    }

    fn save_recurring_occurrences(&self, occurrences: &[RecurringOccurrence]) -> Result<()> {
        self.collections()?.occurrences = occurrences.to_vec();
        self.record("recurring_occurrences", |c| c.occurrences += 1)
    }

    fn load_settings(&self) -> Result<Settings> {
        Ok(self.collections()?.settings.clone())
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.collections()?.settings = settings.clone();
        self.record("settings", |c| c.settings += 1)
    }
}
