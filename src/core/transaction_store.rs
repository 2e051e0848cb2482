//! Aggregate root for transactions and accounts.
//!
//! Every mutation validates, applies its balance delta, invalidates the cache
//! groups it can affect and persists transactions before accounts. Reads are
//! memoized in an [`LruCache`] and recomputed only after invalidation or when
//! the calendar day changes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::cache::{CacheKey, InvalidationGroup, LruCache};
use crate::core::clock::Clock;
use crate::core::debounce::CoalescingTask;
use crate::core::services::{
    BalanceService, CategoryExpense, Direction, Summary, SummaryService, TimeFilter,
};
use crate::currency::CurrencyConverter;
use crate::errors::{CoreError, Result};
use crate::ledger::{
    account::sort_for_display, Account, Category, CategoryKind, Settings, Transaction,
    TransactionType,
};
use crate::storage::Repository;

const TRANSFER_CATEGORY: &str = "Transfer";

#[derive(Debug, Clone)]
enum CachedReport {
    Summary(Summary),
    CategoryExpenses(Vec<CategoryExpense>),
    Amount(Decimal),
}

pub struct TransactionStore {
    repository: Arc<dyn Repository>,
    converter: Arc<dyn CurrencyConverter>,
    clock: Arc<dyn Clock>,
    transactions: Vec<Transaction>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    settings: Settings,
    cache: LruCache<CachedReport>,
    cache_day: NaiveDate,
    balance_task: CoalescingTask,
    save_task: CoalescingTask,
}

impl TransactionStore {
    pub fn new(
        repository: Arc<dyn Repository>,
        converter: Arc<dyn CurrencyConverter>,
        clock: Arc<dyn Clock>,
        cache_capacity: usize,
    ) -> Self {
        let today = clock.today();
        Self {
            repository,
            converter,
            clock,
            transactions: Vec::new(),
            accounts: Vec::new(),
            categories: Vec::new(),
            settings: Settings::default(),
            cache: LruCache::new(cache_capacity),
            cache_day: today,
            balance_task: CoalescingTask::new("balances"),
            save_task: CoalescingTask::new("save"),
        }
    }

    /// Replaces in-memory state with the repository contents and replays balances.
    pub fn load(&mut self) -> Result<()> {
        self.transactions = self.repository.load_transactions()?;
        self.accounts = self.repository.load_accounts()?;
        self.categories = self.repository.load_categories()?;
        self.settings = self.repository.load_settings()?;
        sort_for_display(&mut self.accounts);
        self.cache.remove_all();
        self.cache_day = self.clock.today();
        self.recalculate_balances();
        tracing::info!(
            transactions = self.transactions.len(),
            accounts = self.accounts.len(),
            categories = self.categories.len(),
            "transaction store loaded"
        );
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn base_currency(&self) -> &str {
        &self.settings.base_currency
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_ids(&self) -> HashSet<Uuid> {
        self.transactions.iter().map(|txn| txn.id).collect()
    }

    /// Accounts in display order. Balances are as of the last recalculation;
    /// a pending replay or a day change is not applied here. Use
    /// [`current_accounts`](Self::current_accounts) or
    /// [`account_balance`](Self::account_balance) for settled values.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn has_pending_work(&self) -> bool {
        self.balance_task.is_pending() || self.save_task.is_pending()
    }

    // Single-transaction commands.

    pub fn add(&mut self, mut txn: Transaction) -> Result<Transaction> {
        self.roll_day();
        self.validate(&txn)?;
        self.fill_converted_amount(&mut txn);
        let today = self.today();
        BalanceService::apply(
            &mut self.accounts,
            &txn,
            Direction::Apply,
            self.converter.as_ref(),
            today,
        );
        self.transactions.push(txn.clone());
        self.invalidate(&InvalidationGroup::ALL);
        self.save()?;
        tracing::debug!(id = %txn.id, kind = ?txn.kind, "transaction added");
        Ok(txn)
    }

    /// Replaces the transaction with the same id; the old balance delta is
    /// reversed before the new one is applied.
    pub fn update(&mut self, mut txn: Transaction) -> Result<Transaction> {
        self.roll_day();
        let index = self.position(txn.id)?;
        self.validate(&txn)?;
        self.fill_converted_amount(&mut txn);
        let today = self.today();
        let old = std::mem::replace(&mut self.transactions[index], txn.clone());
        BalanceService::apply(
            &mut self.accounts,
            &old,
            Direction::Reverse,
            self.converter.as_ref(),
            today,
        );
        BalanceService::apply(
            &mut self.accounts,
            &txn,
            Direction::Apply,
            self.converter.as_ref(),
            today,
        );
        self.invalidate(&InvalidationGroup::ALL);
        self.save()?;
        Ok(txn)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Transaction> {
        self.roll_day();
        let index = self.position(id)?;
        let removed = self.transactions.remove(index);
        let today = self.today();
        BalanceService::apply(
            &mut self.accounts,
            &removed,
            Direction::Reverse,
            self.converter.as_ref(),
            today,
        );
        self.invalidate(&InvalidationGroup::ALL);
        self.save()?;
        Ok(removed)
    }

    /// Records one internal transfer moving `amount` (in the source account's
    /// currency) from `from` to `to`.
    pub fn transfer(
        &mut self,
        from: Uuid,
        to: Uuid,
        amount: Decimal,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        let currency = self
            .account(from)
            .map(|account| account.currency.clone())
            .ok_or(CoreError::AccountNotFound(from))?;
        let txn = Transaction::new(TransactionType::InternalTransfer, from, date, amount, currency)
            .with_category(TRANSFER_CATEGORY, None)
            .with_description(description)
            .with_target_account(to);
        self.add(txn)
    }

    // Accounts and categories.

    pub fn add_account(&mut self, account: Account) -> Result<Account> {
        self.accounts.push(account.clone());
        sort_for_display(&mut self.accounts);
        self.recalculate_balances();
        self.save()?;
        Ok(account)
    }

    /// Removes the account together with every transaction touching it.
    /// Returns the number of transactions removed.
    pub fn delete_account(&mut self, id: Uuid) -> Result<usize> {
        let index = self
            .accounts
            .iter()
            .position(|account| account.id == id)
            .ok_or(CoreError::AccountNotFound(id))?;
        self.accounts.remove(index);
        let removed = self.remove_where(|txn| txn.touches_account(id)).len();
        self.recalculate_balances();
        self.save()?;
        tracing::info!(account = %id, removed, "account deleted");
        Ok(removed)
    }

    pub fn add_category(&mut self, category: Category) -> Result<Category> {
        self.categories.push(category.clone());
        self.invalidate(&[InvalidationGroup::CategoryRelated]);
        self.repository.save_categories(&self.categories)?;
        Ok(category)
    }

    pub fn set_base_currency(&mut self, currency: impl Into<String>) -> Result<()> {
        self.settings.base_currency = currency.into();
        let converter = Arc::clone(&self.converter);
        let base = self.settings.base_currency.clone();
        for txn in &mut self.transactions {
            txn.converted_amount = converted_amount(converter.as_ref(), &base, txn);
        }
        self.cache.remove_all();
        self.repository.save_settings(&self.settings)?;
        self.save()
    }

    // Bulk operations used by the recurring coordinator. These only mark
    // balances and persistence as due; callers flush or recalculate.

    pub fn insert_generated(&mut self, transactions: Vec<Transaction>) {
        if transactions.is_empty() {
            return;
        }
        for mut txn in transactions {
            self.fill_converted_amount(&mut txn);
            self.transactions.push(txn);
        }
        self.invalidate(&InvalidationGroup::ALL);
        self.schedule_balance_recalculation();
    }

    /// Removes and returns every transaction matching `predicate`.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<Transaction>
    where
        F: FnMut(&Transaction) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.transactions)
            .into_iter()
            .partition(|txn| predicate(txn));
        self.transactions = kept;
        if !removed.is_empty() {
            self.invalidate(&InvalidationGroup::ALL);
            self.schedule_balance_recalculation();
        }
        removed
    }

    /// Demotes every entry of `series_id` to a plain record.
    pub fn clear_series_links(&mut self, series_id: Uuid) -> usize {
        let mut cleared = 0;
        for txn in self
            .transactions
            .iter_mut()
            .filter(|txn| txn.recurring_series_id == Some(series_id))
        {
            txn.clear_recurring_link();
            cleared += 1;
        }
        if cleared > 0 {
            self.invalidate(&InvalidationGroup::ALL);
        }
        cleared
    }

    pub fn replace_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.invalidate(&InvalidationGroup::ALL);
        self.schedule_balance_recalculation();
    }

    // Deferred work.

    pub fn schedule_balance_recalculation(&mut self) {
        self.balance_task.schedule();
    }

    pub fn schedule_save(&mut self) {
        self.save_task.schedule();
    }

    /// Runs whatever deferred work is due, balances first.
    pub fn flush_pending(&mut self) -> Result<()> {
        if self.balance_task.take() {
            self.replay_balances();
        }
        if self.save_task.take() {
            self.write_collections()?;
        }
        Ok(())
    }

    /// Full replay of every account balance from its initial value.
    pub fn recalculate_balances(&mut self) {
        self.balance_task.cancel();
        self.replay_balances();
    }

    /// Persists transactions, then accounts.
    pub fn save(&mut self) -> Result<()> {
        self.save_task.cancel();
        self.write_collections()
    }

    // Cached reads.

    pub fn summary(&mut self, filter: &TimeFilter) -> Summary {
        self.roll_day();
        let today = self.cache_day;
        let key = CacheKey::Summary(filter.cache_label(today)).to_string();
        if let Some(CachedReport::Summary(summary)) = self.cache.get(&key) {
            return summary.clone();
        }
        let Self {
            transactions,
            cache,
            converter,
            settings,
            ..
        } = self;
        let base = settings.base_currency.as_str();
        let summary = SummaryService::summarize(
            transactions.iter(),
            filter.resolve(today),
            today,
            base,
            |txn| base_amount(cache, &**converter, base, txn),
        );
        cache.set(key, CachedReport::Summary(summary.clone()));
        summary
    }

    pub fn category_expenses(&mut self, filter: &TimeFilter) -> Vec<CategoryExpense> {
        self.roll_day();
        let today = self.cache_day;
        let key = CacheKey::CategoryExpenses(filter.cache_label(today)).to_string();
        if let Some(CachedReport::CategoryExpenses(report)) = self.cache.get(&key) {
            return report.clone();
        }
        let Self {
            transactions,
            cache,
            converter,
            settings,
            ..
        } = self;
        let base = settings.base_currency.as_str();
        let report = SummaryService::category_expenses(
            transactions.iter(),
            filter.resolve(today),
            today,
            |txn| base_amount(cache, &**converter, base, txn),
        );
        cache.set(key, CachedReport::CategoryExpenses(report.clone()));
        report
    }

    /// Total expenses dated `date`, in the base currency.
    pub fn expenses_for(&mut self, date: NaiveDate) -> Decimal {
        self.roll_day();
        let key = CacheKey::DailyExpenses(date).to_string();
        if let Some(CachedReport::Amount(total)) = self.cache.get(&key) {
            return *total;
        }
        let Self {
            transactions,
            cache,
            converter,
            settings,
            ..
        } = self;
        let base = settings.base_currency.as_str();
        let total = SummaryService::expenses_on(transactions.iter(), date, |txn| {
            base_amount(cache, &**converter, base, txn)
        });
        cache.set(key, CachedReport::Amount(total));
        total
    }

    /// Current balance in the account's own currency. A pending balance
    /// recalculation is flushed first.
    pub fn account_balance(&mut self, id: Uuid) -> Result<Decimal> {
        self.roll_day();
        if self.balance_task.take() {
            self.replay_balances();
        }
        let key = CacheKey::Balance(id).to_string();
        if let Some(CachedReport::Amount(balance)) = self.cache.get(&key) {
            return Ok(*balance);
        }
        let balance = self
            .account(id)
            .map(|account| account.balance)
            .ok_or(CoreError::AccountNotFound(id))?;
        self.cache.set(key, CachedReport::Amount(balance));
        Ok(balance)
    }

    /// Accounts in display order after applying any day change and pending
    /// balance recalculation.
    pub fn current_accounts(&mut self) -> &[Account] {
        self.roll_day();
        if self.balance_task.take() {
            self.replay_balances();
        }
        &self.accounts
    }

    // Internals.

    fn position(&self, id: Uuid) -> Result<usize> {
        self.transactions
            .iter()
            .position(|txn| txn.id == id)
            .ok_or(CoreError::TransactionNotFound(id))
    }

    fn validate(&self, txn: &Transaction) -> Result<()> {
        if txn.amount <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "transaction amount must be positive, got {}",
                txn.amount
            )));
        }
        if self.account(txn.account_id).is_none() {
            return Err(CoreError::AccountNotFound(txn.account_id));
        }
        if txn.kind.is_transfer() {
            let target = txn.target_account_id.ok_or_else(|| {
                CoreError::InvalidTransfer("transfer requires a target account".into())
            })?;
            if target == txn.account_id {
                return Err(CoreError::InvalidTransfer(
                    "source and target accounts must differ".into(),
                ));
            }
            if self.account(target).is_none() {
                return Err(CoreError::AccountNotFound(target));
            }
        }
        if txn.kind.requires_category() {
            let wanted = match txn.kind {
                TransactionType::Income => CategoryKind::Income,
                _ => CategoryKind::Expense,
            };
            let known = self
                .categories
                .iter()
                .any(|category| category.kind == wanted && category.matches(&txn.category));
            if !known {
                return Err(CoreError::CategoryNotFound(txn.category.clone()));
            }
        }
        Ok(())
    }

    fn fill_converted_amount(&self, txn: &mut Transaction) {
        txn.converted_amount =
            converted_amount(self.converter.as_ref(), &self.settings.base_currency, txn);
    }

    /// Drops every memo after the calendar day changes and replays balances,
    /// since entries dated "tomorrow" may now count.
    fn roll_day(&mut self) {
        let today = self.clock.today();
        if today == self.cache_day {
            return;
        }
        tracing::debug!(
            from = %self.cache_day,
            to = %today,
            "day changed, dropping cached reports"
        );
        self.cache_day = today;
        self.cache.remove_all();
        self.recalculate_balances();
    }

    fn invalidate(&mut self, groups: &[InvalidationGroup]) {
        for group in groups {
            for prefix in group.prefixes() {
                self.cache.remove_with_prefix(prefix);
            }
        }
    }

    fn replay_balances(&mut self) {
        let today = self.clock.today();
        BalanceService::recompute(
            &mut self.accounts,
            &self.transactions,
            self.converter.as_ref(),
            today,
        );
        self.invalidate(&[InvalidationGroup::Balances]);
    }

    fn write_collections(&self) -> Result<()> {
        self.repository.save_transactions(&self.transactions)?;
        self.repository.save_accounts(&self.accounts)?;
        Ok(())
    }
}

fn converted_amount(
    converter: &dyn CurrencyConverter,
    base: &str,
    txn: &Transaction,
) -> Option<Decimal> {
    if txn.currency.eq_ignore_ascii_case(base) {
        None
    } else {
        Some(converter.convert(txn.amount, &txn.currency, base))
    }
}

/// Base-currency amount, memoized under the conversions namespace when the
/// transaction carries no precomputed value.
fn base_amount(
    cache: &mut LruCache<CachedReport>,
    converter: &dyn CurrencyConverter,
    base: &str,
    txn: &Transaction,
) -> Decimal {
    if let Some(converted) = txn.converted_amount {
        return converted;
    }
    if txn.currency.eq_ignore_ascii_case(base) {
        return txn.amount;
    }
    let key = CacheKey::Conversion {
        amount: txn.amount,
        from: txn.currency.clone(),
        to: base.to_string(),
    }
    .to_string();
    if let Some(CachedReport::Amount(amount)) = cache.get(&key) {
        return *amount;
    }
    let amount = converter.convert(txn.amount, &txn.currency, base);
    cache.set(key, CachedReport::Amount(amount));
    amount
}
