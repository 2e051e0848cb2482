//! Rule checks over recurring-series definitions. Pure, no side effects.

use uuid::Uuid;

use crate::errors::{CoreError, Result};
use crate::ledger::RecurringSeries;

pub struct ValidationService;

impl ValidationService {
    pub fn validate(series: &RecurringSeries) -> Result<()> {
        if series.amount <= rust_decimal::Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "series amount must be positive, got {}",
                series.amount
            )));
        }
        if series.start().is_none() {
            return Err(CoreError::InvalidStartDate(series.start_date.clone()));
        }
        if series.description.trim().is_empty() {
            return Err(CoreError::InvalidAmount("description must not be empty".into()));
        }
        if series.currency.trim().is_empty() {
            return Err(CoreError::InvalidAmount("currency must not be empty".into()));
        }
        if series.is_subscription {
            if series.subscription_status.is_none() {
                return Err(CoreError::InvalidAmount(
                    "subscription requires a status".into(),
                ));
            }
            if let Some(offsets) = &series.reminder_offsets {
                if let Some(bad) = offsets.iter().find(|offset| **offset <= 0) {
                    return Err(CoreError::InvalidAmount(format!(
                        "reminder offsets must be positive, got {bad}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn find_series(id: Uuid, series: &[RecurringSeries]) -> Result<&RecurringSeries> {
        series
            .iter()
            .find(|candidate| candidate.id == id)
            .ok_or(CoreError::SeriesNotFound(id))
    }

    /// Like [`find_series`](Self::find_series) but also rejects non-subscriptions.
    pub fn find_subscription(id: Uuid, series: &[RecurringSeries]) -> Result<&RecurringSeries> {
        Self::find_series(id, series)
            .ok()
            .filter(|candidate| candidate.is_subscription)
            .ok_or(CoreError::SeriesNotFound(id))
    }

    /// True iff a field that shapes future dates or amounts changed.
    pub fn needs_regeneration(old: &RecurringSeries, new: &RecurringSeries) -> bool {
        let start_changed = match (old.start(), new.start()) {
            (Some(before), Some(after)) => before != after,
            _ => old.start_date.trim() != new.start_date.trim(),
        };
        old.frequency != new.frequency
            || start_changed
            || old.amount != new.amount
            || old.category != new.category
            || old.subcategory != new.subcategory
    }
}
