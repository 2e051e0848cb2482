#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use finance_core::{
    core::{
        services::{BalanceService, SummaryService, TimeFilter},
        FixedClock, RecurringCoordinator, TransactionStore,
    },
    currency::IdentityConverter,
    ledger::{Account, Category, CategoryKind, Frequency, RecurringSeries, Transaction},
    notifications::NotificationScheduler,
    storage::InMemoryRepository,
};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn today() -> NaiveDate {
    date(2025, 3, 15)
}

pub fn categories() -> Vec<Category> {
    vec![
        Category::new("Food", CategoryKind::Expense).with_subcategory("Groceries"),
        Category::new("Housing", CategoryKind::Expense),
        Category::new("Media", CategoryKind::Expense),
        Category::new("Salary", CategoryKind::Income),
    ]
}

/// Repository seeded with the given accounts and the default category set.
pub fn repository(accounts: Vec<Account>) -> Arc<InMemoryRepository> {
    Arc::new(
        InMemoryRepository::new()
            .with_accounts(accounts)
            .with_categories(categories()),
    )
}

pub fn store_on(repo: Arc<InMemoryRepository>, today: NaiveDate) -> TransactionStore {
    let mut store = TransactionStore::new(
        repo,
        Arc::new(IdentityConverter),
        Arc::new(FixedClock::new(today)),
        64,
    );
    store.load().expect("load store");
    store
}

pub fn checking(balance: i64) -> Account {
    Account::new("Checking", "USD", Decimal::from(balance))
}

pub fn monthly(
    start: NaiveDate,
    amount: i64,
    category: &str,
    description: &str,
) -> RecurringSeries {
    RecurringSeries::new(
        Frequency::Monthly,
        start,
        Decimal::from(amount),
        "USD",
        category,
        description,
    )
}

/// Reads every report through the store (warming or hitting its cache) and
/// compares it with a fresh computation over the current transactions.
pub fn assert_reports_match_ledger(store: &mut TransactionStore, days: &[NaiveDate]) {
    let day = store.today();
    let currency = store.base_currency().to_string();
    let transactions = store.transactions().to_vec();
    let base = |txn: &Transaction| txn.converted_amount.unwrap_or(txn.amount);

    for filter in [TimeFilter::ThisMonth, TimeFilter::AllTime] {
        let range = filter.resolve(day);
        let expected = SummaryService::summarize(&transactions, range, day, &currency, base);
        assert_eq!(store.summary(&filter), expected, "summary for {filter:?}");
        let expected = SummaryService::category_expenses(&transactions, range, day, base);
        assert_eq!(
            store.category_expenses(&filter),
            expected,
            "category expenses for {filter:?}"
        );
    }
    for date in days {
        let expected = SummaryService::expenses_on(&transactions, *date, base);
        assert_eq!(store.expenses_for(*date), expected, "expenses on {date}");
    }

    let mut accounts = store.accounts().to_vec();
    BalanceService::recompute(&mut accounts, &transactions, &IdentityConverter, day);
    for account in &accounts {
        assert_eq!(
            store.account_balance(account.id).expect("known account"),
            account.balance,
            "balance of {}",
            account.name
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reminder {
    Scheduled(Uuid, NaiveDate),
    Cancelled(Uuid),
}

/// Scheduler that records every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    calls: Mutex<Vec<Reminder>>,
}

impl RecordingScheduler {
    pub fn calls(&self) -> Vec<Reminder> {
        self.calls.lock().expect("lock reminder log").clone()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("lock reminder log").clear();
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule(&self, series: &RecurringSeries, next_charge: NaiveDate) {
        self.calls
            .lock()
            .expect("lock reminder log")
            .push(Reminder::Scheduled(series.id, next_charge));
    }

    fn cancel(&self, series_id: Uuid) {
        self.calls
            .lock()
            .expect("lock reminder log")
            .push(Reminder::Cancelled(series_id));
    }
}

pub struct Harness {
    pub coordinator: RecurringCoordinator,
    pub repo: Arc<InMemoryRepository>,
    pub scheduler: Arc<RecordingScheduler>,
    pub account: Uuid,
}

/// Coordinator over a single USD checking account with 10 000 opening balance.
pub fn harness(today: NaiveDate) -> Harness {
    let account = checking(10_000);
    let account_id = account.id;
    let repo = repository(vec![account]);
    let scheduler = Arc::new(RecordingScheduler::default());
    let coordinator = RecurringCoordinator::builder()
        .store(store_on(Arc::clone(&repo), today))
        .repository(repo.clone())
        .notifications(scheduler.clone())
        .horizon_months(3)
        .build()
        .expect("build coordinator");
    Harness {
        coordinator,
        repo,
        scheduler,
        account: account_id,
    }
}
