use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{frequency::Frequency, transaction::TransactionType};
use crate::utils::dates::{format_date, parse_date};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Archived,
}

/// Lifecycle state of a series as seen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesState {
    Active,
    Paused,
    Archived,
    Stopped,
}

/// A recurrence template expanded into dated transactions by the generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSeries {
    pub id: Uuid,
    pub frequency: Frequency,
    /// Calendar date in `yyyy-MM-dd` form.
    pub start_date: String,
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub description: String,
    #[serde(default = "RecurringSeries::default_kind")]
    pub kind: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default = "RecurringSeries::default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_subscription: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    /// Days before a charge on which reminders fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_offsets: Option<Vec<i32>>,
    /// Day of the last schedule-changing edit. Dates on or before it are
    /// never backfilled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regenerated_on: Option<String>,
}

impl RecurringSeries {
    pub fn new(
        frequency: Frequency,
        start_date: NaiveDate,
        amount: Decimal,
        currency: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            frequency,
            start_date: format_date(start_date),
            amount,
            currency: currency.into(),
            category: category.into(),
            subcategory: None,
            description: description.into(),
            kind: Self::default_kind(),
            account_id: None,
            is_active: true,
            is_subscription: false,
            subscription_status: None,
            reminder_offsets: None,
            regenerated_on: None,
        }
    }

    /// Marks the series as an active subscription with the given reminder offsets.
    pub fn into_subscription(mut self, reminder_offsets: Vec<i32>) -> Self {
        self.is_subscription = true;
        self.subscription_status = Some(SubscriptionStatus::Active);
        self.reminder_offsets = Some(reminder_offsets);
        self
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_kind(mut self, kind: TransactionType) -> Self {
        self.kind = kind;
        self
    }

    /// Parsed start date; `None` when the stored string is malformed.
    pub fn start(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    /// Parsed [`regenerated_on`](Self::regenerated_on).
    pub fn regenerated_on(&self) -> Option<NaiveDate> {
        self.regenerated_on.as_deref().and_then(parse_date)
    }

    pub fn mark_regenerated(&mut self, today: NaiveDate) {
        self.regenerated_on = Some(format_date(today));
    }

    pub fn state(&self) -> SeriesState {
        if self.is_subscription {
            match self.subscription_status {
                Some(SubscriptionStatus::Paused) => return SeriesState::Paused,
                Some(SubscriptionStatus::Archived) => return SeriesState::Archived,
                _ => {}
            }
        }
        if self.is_active {
            SeriesState::Active
        } else {
            SeriesState::Stopped
        }
    }

    /// True for subscriptions that should currently carry reminders.
    pub fn is_active_subscription(&self) -> bool {
        self.is_subscription
            && self.is_active
            && self.subscription_status == Some(SubscriptionStatus::Active)
    }

    /// Every scheduled date from the start date through `until` (inclusive).
    pub fn scheduled_dates(&self, until: NaiveDate) -> Vec<NaiveDate> {
        let Some(start) = self.start() else {
            return Vec::new();
        };
        (0..=u32::MAX)
            .map_while(|index| self.frequency.nth_date(start, index))
            .take_while(|date| *date <= until)
            .collect()
    }

    /// First scheduled date on or after `reference`.
    pub fn next_date_on_or_after(&self, reference: NaiveDate) -> Option<NaiveDate> {
        let start = self.start()?;
        (0..=u32::MAX)
            .map_while(|index| self.frequency.nth_date(start, index))
            .find(|date| *date >= reference)
    }

    fn default_kind() -> TransactionType {
        TransactionType::Expense
    }

    fn default_active() -> bool {
        true
    }
}

/// Binds one scheduled date of a series to the transaction materialized for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurringOccurrence {
    pub id: Uuid,
    pub series_id: Uuid,
    /// Calendar date in `yyyy-MM-dd` form; together with `series_id` the dedup key.
    pub occurrence_date: String,
    pub transaction_id: Uuid,
}

impl RecurringOccurrence {
    pub fn new(series_id: Uuid, date: NaiveDate, transaction_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            series_id,
            occurrence_date: format_date(date),
            transaction_id,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        parse_date(&self.occurrence_date)
    }

    pub fn key(&self) -> (Uuid, &str) {
        (self.series_id, self.occurrence_date.as_str())
    }
}
