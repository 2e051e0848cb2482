use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::{
    errors::Result,
    ledger::{Account, Category, RecurringOccurrence, RecurringSeries, Settings, Transaction},
    utils::paths::{app_data_dir, data_dir_in, ensure_dir},
};

use super::Repository;

const TMP_SUFFIX: &str = "tmp";
const TRANSACTIONS_FILE: &str = "transactions.json";
const ACCOUNTS_FILE: &str = "accounts.json";
const CATEGORIES_FILE: &str = "categories.json";
const SERIES_FILE: &str = "recurring_series.json";
const OCCURRENCES_FILE: &str = "recurring_occurrences.json";
const SETTINGS_FILE: &str = "settings.json";

/// Stores each collection as a pretty-printed JSON document inside one directory.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    root: PathBuf,
}

impl JsonRepository {
    /// Opens (and creates if needed) the data directory. `None` resolves to the
    /// application data directory.
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(|| data_dir_in(&app_data_dir()));
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True once settings have been written to this directory.
    pub fn has_settings(&self) -> bool {
        self.path(SETTINGS_FILE).exists()
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn load_collection<T>(&self, file: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let data = fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save_collection<T>(&self, file: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let path = self.path(file);
        let json = serde_json::to_string_pretty(value)?;
        replace_file(&path, &json)?;
        tracing::trace!(path = %path.display(), "saved collection");
        Ok(())
    }
}

impl Repository for JsonRepository {
    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        self.load_collection(TRANSACTIONS_FILE)
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.save_collection(TRANSACTIONS_FILE, transactions)
    }

    fn load_accounts(&self) -> Result<Vec<Account>> {
        self.load_collection(ACCOUNTS_FILE)
    }

    fn save_accounts(&self, accounts: &[Account]) -> Result<()> {
        self.save_collection(ACCOUNTS_FILE, accounts)
    }

    fn load_categories(&self) -> Result<Vec<Category>> {
        self.load_collection(CATEGORIES_FILE)
    }

    fn save_categories(&self, categories: &[Category]) -> Result<()> {
        self.save_collection(CATEGORIES_FILE, categories)
    }

    fn load_recurring_series(&self) -> Result<Vec<RecurringSeries>> {
        self.load_collection(SERIES_FILE)
    }

    fn save_recurring_series(&self, series: &[RecurringSeries]) -> Result<()> {
        self.save_collection(SERIES_FILE, series)
    }

    fn load_recurring_occurrences(&self) -> Result<Vec<RecurringOccurrence>> {
        self.load_collection(OCCURRENCES_FILE)
    }

    fn save_recurring_occurrences(&self, occurrences: &[RecurringOccurrence]) -> Result<()> {
        self.save_collection(OCCURRENCES_FILE, occurrences)
    }

    fn load_settings(&self) -> Result<Settings> {
        self.load_collection(SETTINGS_FILE)
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.save_collection(SETTINGS_FILE, settings)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Writes `data` beside `path` and renames it into place.
pub(crate) fn replace_file(path: &Path, data: &str) -> io::Result<()> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, data)?;
    fs::rename(&tmp, path)
}
