//! Reminder scheduling seam. Implementations must swallow their own failures.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::RecurringSeries;

pub trait NotificationScheduler: Send + Sync {
    fn schedule(&self, series: &RecurringSeries, next_charge: NaiveDate);
    fn cancel(&self, series_id: Uuid);

    /// First scheduled date on or after `today`.
    fn next_charge_date(&self, series: &RecurringSeries, today: NaiveDate) -> Option<NaiveDate> {
        series.next_date_on_or_after(today)
    }
}

/// Scheduler that only records intent in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationScheduler;

impl NotificationScheduler for LogNotificationScheduler {
    fn schedule(&self, series: &RecurringSeries, next_charge: NaiveDate) {
        tracing::info!(
            series = %series.id,
            next_charge = %next_charge,
            offsets = ?series.reminder_offsets,
            "scheduled subscription reminders"
        );
    }

    fn cancel(&self, series_id: Uuid) {
        tracing::info!(series = %series_id, "cancelled subscription reminders");
    }
}
