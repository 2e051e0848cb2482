//! Orchestration of recurring-series commands across validation, generation,
//! the transaction store, persistence and reminder scheduling.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::core::services::{
    generation_service::count_link_changes, RecurrenceGenerator, ValidationService,
};
use crate::core::transaction_store::TransactionStore;
use crate::errors::{CoreError, Result};
use crate::ledger::{RecurringOccurrence, RecurringSeries, SubscriptionStatus, Transaction};
use crate::notifications::NotificationScheduler;
use crate::storage::Repository;

const DEFAULT_HORIZON_MONTHS: u32 = 3;

/// Outcome of one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub generated: usize,
    pub occurrences: usize,
    pub converted: usize,
}

/// Collects the collaborators of a [`RecurringCoordinator`]; `build` refuses
/// to produce a coordinator with any of them missing.
#[derive(Default)]
pub struct CoordinatorBuilder {
    store: Option<TransactionStore>,
    repository: Option<Arc<dyn Repository>>,
    notifications: Option<Arc<dyn NotificationScheduler>>,
    horizon_months: Option<u32>,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: TransactionStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn Repository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn notifications(mut self, notifications: Arc<dyn NotificationScheduler>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn horizon_months(mut self, months: u32) -> Self {
        self.horizon_months = Some(months);
        self
    }

    /// Builds the coordinator and loads series and occurrences from the repository.
    pub fn build(self) -> Result<RecurringCoordinator> {
        let store = self
            .store
            .ok_or(CoreError::CoordinatorNotInitialized("transaction store"))?;
        let repository = self
            .repository
            .ok_or(CoreError::CoordinatorNotInitialized("repository"))?;
        let notifications = self
            .notifications
            .ok_or(CoreError::CoordinatorNotInitialized("notification scheduler"))?;
        let series = repository.load_recurring_series()?;
        let occurrences = repository.load_recurring_occurrences()?;
        Ok(RecurringCoordinator {
            store,
            repository,
            notifications,
            series,
            occurrences,
            horizon_months: self.horizon_months.unwrap_or(DEFAULT_HORIZON_MONTHS),
        })
    }
}

pub struct RecurringCoordinator {
    store: TransactionStore,
    repository: Arc<dyn Repository>,
    notifications: Arc<dyn NotificationScheduler>,
    series: Vec<RecurringSeries>,
    occurrences: Vec<RecurringOccurrence>,
    horizon_months: u32,
}

impl RecurringCoordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TransactionStore {
        &mut self.store
    }

    pub fn series(&self) -> &[RecurringSeries] {
        &self.series
    }

    pub fn find_series(&self, id: Uuid) -> Result<&RecurringSeries> {
        ValidationService::find_series(id, &self.series)
    }

    pub fn occurrences(&self) -> &[RecurringOccurrence] {
        &self.occurrences
    }

    pub fn occurrences_of(&self, series_id: Uuid) -> Vec<&RecurringOccurrence> {
        self.occurrences
            .iter()
            .filter(|occurrence| occurrence.series_id == series_id)
            .collect()
    }

    pub fn horizon_months(&self) -> u32 {
        self.horizon_months
    }

    pub fn next_charge_date(&self, id: Uuid) -> Result<Option<NaiveDate>> {
        let series = self.find_series(id)?;
        Ok(self
            .notifications
            .next_charge_date(series, self.store.today()))
    }

    pub fn create_series(&mut self, series: RecurringSeries) -> Result<GenerationReport> {
        ValidationService::validate(&series)?;
        if self.index_of(series.id).is_ok() {
            return Err(CoreError::DuplicateSeries(series.id));
        }
        tracing::info!(
            series = %series.id,
            frequency = series.frequency.label(),
            "creating recurring series"
        );
        self.series.push(series.clone());
        self.repository.save_recurring_series(&self.series)?;
        let report = self.materialize(self.horizon_months)?;
        if series.is_active_subscription() {
            self.schedule_reminders(&series);
        }
        Ok(report)
    }

    /// Replaces a series. Changes to its schedule or booking fields drop every
    /// generated entry dated after today and regenerate from the new template.
    /// Dates on or before today are never backfilled by the new schedule.
    pub fn update_series(&mut self, mut series: RecurringSeries) -> Result<GenerationReport> {
        ValidationService::validate(&series)?;
        let index = self.index_of(series.id)?;
        let regenerate = ValidationService::needs_regeneration(&self.series[index], &series);
        if series.regenerated_on.is_none() {
            series.regenerated_on = self.series[index].regenerated_on.clone();
        }
        if regenerate {
            series.mark_regenerated(self.store.today());
        }
        self.series[index] = series.clone();
        self.repository.save_recurring_series(&self.series)?;
        tracing::info!(series = %series.id, regenerate, "updating recurring series");

        let mut report = GenerationReport::default();
        if regenerate {
            let today = self.store.today();
            self.drop_generated_after(series.id, today)?;
            report = self.materialize(self.horizon_months)?;
        }
        if series.is_subscription {
            self.notifications.cancel(series.id);
            if series.is_active_subscription() {
                self.schedule_reminders(&series);
            }
        }
        Ok(report)
    }

    /// Deactivates the series and removes entries dated after
    /// `max(from, today)`.
    pub fn stop_series(&mut self, id: Uuid, from: NaiveDate) -> Result<usize> {
        let index = self.index_of(id)?;
        self.series[index].is_active = false;
        self.repository.save_recurring_series(&self.series)?;
        let cutoff = from.max(self.store.today());
        let removed = self.drop_generated_after(id, cutoff)?;
        self.store.recalculate_balances();
        self.store.save()?;
        self.notifications.cancel(id);
        tracing::info!(series = %id, cutoff = %cutoff, removed, "stopped recurring series");
        Ok(removed)
    }

    /// Removes the series and all of its occurrences. Linked transactions are
    /// deleted or demoted to plain records depending on `delete_transactions`.
    /// Balances and persistence of the store are deferred.
    pub fn delete_series(&mut self, id: Uuid, delete_transactions: bool) -> Result<usize> {
        let index = self.index_of(id)?;
        self.series.remove(index);
        let affected = if delete_transactions {
            self.store
                .remove_where(|txn| txn.recurring_series_id == Some(id))
                .len()
        } else {
            self.store.clear_series_links(id)
        };
        self.occurrences.retain(|occurrence| occurrence.series_id != id);
        self.repository.save_recurring_series(&self.series)?;
        self.repository
            .save_recurring_occurrences(&self.occurrences)?;
        self.notifications.cancel(id);
        self.store.schedule_balance_recalculation();
        self.store.schedule_save();
        tracing::info!(series = %id, delete_transactions, affected, "deleted recurring series");
        Ok(affected)
    }

    pub fn pause_subscription(&mut self, id: Uuid) -> Result<()> {
        self.set_subscription_status(id, SubscriptionStatus::Paused, false)?;
        self.notifications.cancel(id);
        tracing::info!(series = %id, "paused subscription");
        Ok(())
    }

    /// Reactivates the subscription, fills in any missing dates and reschedules
    /// reminders for the next charge.
    pub fn resume_subscription(&mut self, id: Uuid) -> Result<GenerationReport> {
        self.set_subscription_status(id, SubscriptionStatus::Active, true)?;
        let report = self.materialize(self.horizon_months)?;
        let series = self.find_series(id)?.clone();
        self.schedule_reminders(&series);
        tracing::info!(series = %id, "resumed subscription");
        Ok(report)
    }

    pub fn archive_subscription(&mut self, id: Uuid) -> Result<()> {
        self.set_subscription_status(id, SubscriptionStatus::Archived, false)?;
        self.notifications.cancel(id);
        tracing::info!(series = %id, "archived subscription");
        Ok(())
    }

    /// Reloads series and occurrences from the repository, generates up to
    /// `horizon_months` ahead and demotes past-due entries.
    pub fn generate_all_transactions(&mut self, horizon_months: u32) -> Result<GenerationReport> {
        self.series = self.repository.load_recurring_series()?;
        self.occurrences = self.repository.load_recurring_occurrences()?;
        let report = self.materialize(horizon_months)?;
        tracing::info!(
            generated = report.generated,
            converted = report.converted,
            horizon_months,
            "generated recurring transactions"
        );
        Ok(report)
    }

    /// Deletes one transaction and the occurrence bound to it.
    pub fn delete_transaction(&mut self, id: Uuid) -> Result<Transaction> {
        let removed = self.store.delete(id)?;
        let before = self.occurrences.len();
        self.occurrences
            .retain(|occurrence| occurrence.transaction_id != removed.id);
        if self.occurrences.len() != before {
            self.repository
                .save_recurring_occurrences(&self.occurrences)?;
        }
        Ok(removed)
    }

    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.series
            .iter()
            .position(|series| series.id == id)
            .ok_or(CoreError::SeriesNotFound(id))
    }

    fn set_subscription_status(
        &mut self,
        id: Uuid,
        status: SubscriptionStatus,
        active: bool,
    ) -> Result<()> {
        ValidationService::find_subscription(id, &self.series)?;
        let index = self.index_of(id)?;
        let series = &mut self.series[index];
        series.subscription_status = Some(status);
        series.is_active = active;
        self.repository.save_recurring_series(&self.series)
    }

    /// Removes transactions and occurrences of `series_id` dated after `cutoff`.
    fn drop_generated_after(&mut self, series_id: Uuid, cutoff: NaiveDate) -> Result<usize> {
        let removed = self
            .store
            .remove_where(|txn| txn.recurring_series_id == Some(series_id) && txn.date > cutoff)
            .len();
        self.occurrences.retain(|occurrence| {
            occurrence.series_id != series_id
                || occurrence.date().map_or(true, |date| date <= cutoff)
        });
        self.repository
            .save_recurring_occurrences(&self.occurrences)?;
        Ok(removed)
    }

    fn materialize(&mut self, horizon_months: u32) -> Result<GenerationReport> {
        let generator = RecurrenceGenerator::new(self.store.today());
        let delta = generator.generate(
            &self.series,
            &self.occurrences,
            &self.store.transaction_ids(),
            self.store.accounts(),
            horizon_months,
        );
        let mut report = GenerationReport {
            generated: delta.transactions.len(),
            occurrences: delta.occurrences.len(),
            converted: 0,
        };
        if !delta.occurrences.is_empty() {
            self.occurrences.extend(delta.occurrences);
            self.repository
                .save_recurring_occurrences(&self.occurrences)?;
        }
        self.store.insert_generated(delta.transactions);

        let converted =
            generator.convert_past_recurring_to_regular(self.store.transactions(), &self.series);
        report.converted = count_link_changes(self.store.transactions(), &converted);
        if report.converted > 0 {
            tracing::debug!(converted = report.converted, "demoted past-due recurring entries");
            self.store.replace_transactions(converted);
        }

        self.store.recalculate_balances();
        self.store.save()?;
        Ok(report)
    }

    fn schedule_reminders(&self, series: &RecurringSeries) {
        match self
            .notifications
            .next_charge_date(series, self.store.today())
        {
            Some(next) => self.notifications.schedule(series, next),
            None => tracing::debug!(series = %series.id, "no upcoming charge to remind about"),
        }
    }
}
