mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{assert_reports_match_ledger, date, harness, monthly, store_on, today, Reminder};
use finance_core::{
    core::{services::TimeFilter, RecurringCoordinator},
    errors::{CoreError, ErrorKind},
    ledger::{Frequency, SeriesState},
    storage::Repository,
};
use rust_decimal::Decimal;

#[test]
fn generation_is_idempotent() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    let report = h.coordinator.create_series(series).expect("create series");
    assert_eq!(report.generated, 3);

    let again = h
        .coordinator
        .generate_all_transactions(3)
        .expect("regenerate");
    assert_eq!(again.generated, 0);
    assert_eq!(again.occurrences, 0);
    assert_eq!(h.coordinator.store().transactions().len(), 3);
}

#[test]
fn occurrences_are_unique_per_series_and_date() {
    let mut h = harness(today());
    h.coordinator
        .create_series(monthly(date(2025, 1, 31), 10, "Food", "Snacks"))
        .unwrap();
    h.coordinator.generate_all_transactions(6).unwrap();
    h.coordinator.generate_all_transactions(6).unwrap();

    let keys: Vec<_> = h
        .coordinator
        .occurrences()
        .iter()
        .map(|o| (o.series_id, o.occurrence_date.clone()))
        .collect();
    let unique: HashSet<_> = keys.iter().cloned().collect();
    assert_eq!(keys.len(), unique.len());
    assert!(unique.iter().any(|(_, d)| d == "2025-02-28"));
}

#[test]
fn past_due_entries_become_history() {
    let mut h = harness(today());
    let report = h
        .coordinator
        .create_series(monthly(date(2025, 3, 14), 50, "Media", "Streaming"))
        .unwrap();
    assert_eq!(report.generated, 4);
    assert_eq!(report.converted, 1);

    let txns = h.coordinator.store().transactions();
    let yesterday = txns.iter().find(|t| t.date == date(2025, 3, 14)).unwrap();
    let next = txns.iter().find(|t| t.date == date(2025, 4, 14)).unwrap();
    assert!(!yesterday.is_recurring());
    assert!(next.is_recurring());

    // History is not regenerated on the next pass.
    let again = h.coordinator.generate_all_transactions(3).unwrap();
    assert_eq!(again.generated, 0);
    assert_eq!(h.coordinator.store().transactions().len(), 4);
    assert_eq!(
        h.coordinator.store_mut().account_balance(h.account).unwrap(),
        Decimal::from(9950)
    );
}

#[test]
fn regeneration_touches_only_future_entries() {
    let mut h = harness(today());
    let series = monthly(date(2025, 1, 10), 100, "Housing", "Rent");
    let id = series.id;
    h.coordinator.create_series(series.clone()).unwrap();
    assert_eq!(h.coordinator.store().transactions().len(), 6);

    let mut renamed = series.clone();
    renamed.description = "Flat rent".into();
    let report = h.coordinator.update_series(renamed.clone()).unwrap();
    assert_eq!(report.generated, 0);

    let mut pricier = renamed;
    pricier.amount = Decimal::from(120);
    let report = h.coordinator.update_series(pricier).unwrap();
    assert_eq!(report.generated, 3);

    let txns = h.coordinator.store().transactions();
    assert_eq!(txns.len(), 6);
    for txn in txns {
        let expected = if txn.date <= today() { 100 } else { 120 };
        assert_eq!(txn.amount, Decimal::from(expected), "entry on {}", txn.date);
    }
    assert_eq!(h.coordinator.occurrences_of(id).len(), 6);
}

#[test]
fn schedule_change_never_backfills_history() {
    let mut h = harness(today());
    let series = monthly(date(2025, 1, 10), 100, "Housing", "Rent");
    let id = series.id;
    h.coordinator.create_series(series.clone()).unwrap();
    let history = |txns: &[finance_core::ledger::Transaction]| {
        txns.iter().filter(|t| t.date <= today()).count()
    };
    assert_eq!(history(h.coordinator.store().transactions()), 3);
    let balance = h.coordinator.store_mut().account_balance(h.account).unwrap();
    assert_eq!(balance, Decimal::from(9700));

    let mut weekly = series;
    weekly.frequency = Frequency::Weekly;
    let report = h.coordinator.update_series(weekly).unwrap();
    assert!(report.generated > 0);

    let txns = h.coordinator.store().transactions();
    assert_eq!(history(txns), 3);
    for txn in txns.iter().filter(|t| t.date > today()) {
        assert_eq!((txn.date - date(2025, 1, 10)).num_days() % 7, 0, "entry on {}", txn.date);
    }
    assert_eq!(
        h.coordinator.store_mut().account_balance(h.account).unwrap(),
        balance
    );

    // A later full pass keeps history intact too.
    let again = h.coordinator.generate_all_transactions(3).unwrap();
    assert_eq!(again.generated, 0);
    assert_eq!(history(h.coordinator.store().transactions()), 3);
    let stored = h.repo.load_recurring_series().unwrap();
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].regenerated_on(), Some(today()));
}

#[test]
fn store_reports_follow_series_bulk_changes() {
    let mut h = harness(today());
    let rent = monthly(date(2025, 1, 10), 100, "Housing", "Rent");
    let streaming = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    let streaming_id = streaming.id;
    let days = [date(2025, 3, 10), date(2025, 3, 20), date(2025, 4, 10)];
    h.coordinator.create_series(rent.clone()).unwrap();
    h.coordinator.create_series(streaming).unwrap();
    assert_reports_match_ledger(h.coordinator.store_mut(), &days);
    assert_eq!(
        h.coordinator.store_mut().summary(&TimeFilter::ThisMonth).planned_amount,
        Decimal::from(50)
    );

    let mut pricier = rent;
    pricier.amount = Decimal::from(150);
    h.coordinator.update_series(pricier).unwrap();
    assert_reports_match_ledger(h.coordinator.store_mut(), &days);
    assert_eq!(
        h.coordinator.store_mut().expenses_for(date(2025, 4, 10)),
        Decimal::from(150)
    );

    h.coordinator.delete_series(streaming_id, true).unwrap();
    assert_reports_match_ledger(h.coordinator.store_mut(), &days);
    assert_eq!(
        h.coordinator.store_mut().summary(&TimeFilter::ThisMonth).planned_amount,
        Decimal::ZERO
    );
}

#[test]
fn duplicate_series_id_is_rejected() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    h.coordinator.create_series(series.clone()).unwrap();
    let count = h.coordinator.store().transactions().len();

    let err = h.coordinator.create_series(series.clone()).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateSeries(id) if id == series.id));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(h.coordinator.series().len(), 1);
    assert_eq!(h.coordinator.store().transactions().len(), count);
}

#[test]
fn stop_series_removes_entries_after_cutoff() {
    let mut h = harness(today());
    let series = monthly(date(2025, 1, 10), 100, "Housing", "Rent");
    let id = series.id;
    h.coordinator.create_series(series).unwrap();

    let removed = h.coordinator.stop_series(id, date(2025, 4, 30)).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(h.coordinator.find_series(id).unwrap().state(), SeriesState::Stopped);

    // Cutoff never moves before today.
    let removed = h.coordinator.stop_series(id, date(2020, 1, 1)).unwrap();
    assert_eq!(removed, 1);

    let report = h.coordinator.generate_all_transactions(3).unwrap();
    assert_eq!(report.generated, 0);
    assert!(h
        .coordinator
        .store()
        .transactions()
        .iter()
        .all(|t| t.date <= today()));
    assert!(h.scheduler.calls().contains(&Reminder::Cancelled(id)));
}

#[test]
fn delete_series_with_transactions() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    let id = series.id;
    h.coordinator.create_series(series).unwrap();

    let affected = h.coordinator.delete_series(id, true).unwrap();
    assert_eq!(affected, 3);
    assert!(h.coordinator.store().transactions().is_empty());
    assert!(h.coordinator.occurrences_of(id).is_empty());
    assert!(matches!(
        h.coordinator.find_series(id),
        Err(CoreError::SeriesNotFound(_))
    ));

    // Store writes are deferred until flushed.
    assert!(h.coordinator.store().has_pending_work());
    let before = h.repo.save_counts().transactions;
    h.coordinator.store_mut().flush_pending().unwrap();
    assert_eq!(h.repo.save_counts().transactions, before + 1);
    assert!(h.repo.load_transactions().unwrap().is_empty());
}

#[test]
fn delete_series_keeping_transactions() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    let id = series.id;
    h.coordinator.create_series(series).unwrap();

    let affected = h.coordinator.delete_series(id, false).unwrap();
    assert_eq!(affected, 3);
    let txns = h.coordinator.store().transactions();
    assert_eq!(txns.len(), 3);
    assert!(txns.iter().all(|t| !t.is_recurring()));
    assert!(h.coordinator.occurrences().is_empty());
}

#[test]
fn subscription_lifecycle_drives_reminders() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 12, "Media", "Music").into_subscription(vec![1, 3]);
    let id = series.id;
    h.coordinator.create_series(series).unwrap();
    assert_eq!(
        h.scheduler.calls(),
        vec![Reminder::Scheduled(id, date(2025, 3, 20))]
    );
    assert_eq!(
        h.coordinator.next_charge_date(id).unwrap(),
        Some(date(2025, 3, 20))
    );

    h.scheduler.clear();
    h.coordinator.pause_subscription(id).unwrap();
    assert_eq!(h.coordinator.find_series(id).unwrap().state(), SeriesState::Paused);
    h.coordinator.resume_subscription(id).unwrap();
    assert_eq!(h.coordinator.find_series(id).unwrap().state(), SeriesState::Active);
    h.coordinator.archive_subscription(id).unwrap();
    assert_eq!(h.coordinator.find_series(id).unwrap().state(), SeriesState::Archived);

    assert_eq!(
        h.scheduler.calls(),
        vec![
            Reminder::Cancelled(id),
            Reminder::Scheduled(id, date(2025, 3, 20)),
            Reminder::Cancelled(id),
        ]
    );
}

#[test]
fn subscription_commands_reject_plain_series() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 12, "Media", "Music");
    let id = series.id;
    h.coordinator.create_series(series).unwrap();
    assert!(matches!(
        h.coordinator.pause_subscription(id),
        Err(CoreError::SeriesNotFound(_))
    ));
    assert!(h.scheduler.calls().is_empty());
}

#[test]
fn invalid_series_is_rejected_before_any_write() {
    let mut h = harness(today());
    let mut series = monthly(date(2025, 3, 20), 12, "Media", "Music");
    series.amount = Decimal::ZERO;
    let err = h.coordinator.create_series(series).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(h.coordinator.series().is_empty());
    assert_eq!(h.repo.save_counts().series, 0);

    let unknown = monthly(date(2025, 3, 20), 12, "Media", "Music");
    assert!(matches!(
        h.coordinator.update_series(unknown),
        Err(CoreError::SeriesNotFound(_))
    ));
}

#[test]
fn generate_all_reads_series_from_repository() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 30, "Food", "Meal kit");
    h.repo.save_recurring_series(&[series]).unwrap();

    let report = h.coordinator.generate_all_transactions(1).unwrap();
    assert_eq!(report.generated, 1);
    assert_eq!(h.coordinator.series().len(), 1);
    assert_eq!(h.repo.load_recurring_occurrences().unwrap().len(), 1);
}

#[test]
fn deleting_generated_transaction_drops_its_occurrence() {
    let mut h = harness(today());
    let series = monthly(date(2025, 3, 20), 50, "Media", "Streaming");
    let id = series.id;
    h.coordinator.create_series(series).unwrap();
    let target = h.coordinator.store().transactions()[0].id;

    h.coordinator.delete_transaction(target).unwrap();
    assert_eq!(h.coordinator.occurrences_of(id).len(), 2);
    assert!(h
        .coordinator
        .occurrences()
        .iter()
        .all(|o| o.transaction_id != target));
}

#[test]
fn builder_requires_every_collaborator() {
    let repo = common::repository(vec![common::checking(0)]);
    let missing_repository = RecurringCoordinator::builder()
        .store(store_on(Arc::clone(&repo), today()))
        .notifications(Arc::new(common::RecordingScheduler::default()))
        .build();
    assert!(matches!(
        missing_repository,
        Err(CoreError::CoordinatorNotInitialized(_))
    ));

    let missing_store = RecurringCoordinator::builder()
        .repository(repo)
        .build()
        .err()
        .map(|err| err.kind());
    assert_eq!(missing_store, Some(ErrorKind::Setup));
}
