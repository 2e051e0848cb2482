use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use finance_core::core::services::{
    BalanceService, RecurrenceGenerator, SummaryService, TimeFilter,
};
use finance_core::currency::IdentityConverter;
use finance_core::ledger::{Account, Frequency, RecurringSeries, Transaction, TransactionType};
use finance_core::storage::{JsonRepository, Repository};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn build_accounts() -> Vec<Account> {
    vec![
        Account::new("Checking", "USD", Decimal::from(10_000)),
        Account::new("Savings", "USD", Decimal::from(5_000)),
    ]
}

fn build_transactions(accounts: &[Account], count: usize) -> Vec<Transaction> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    (0..count)
        .map(|idx| {
            let date = start + Duration::days((idx % 365) as i64);
            let amount = Decimal::from(50 + (idx % 100) as i64);
            match idx % 4 {
                0 => Transaction::new(TransactionType::Income, accounts[0].id, date, amount, "USD")
                    .with_category("Salary", None),
                1 => Transaction::new(
                    TransactionType::InternalTransfer,
                    accounts[0].id,
                    date,
                    amount,
                    "USD",
                )
                .with_target_account(accounts[1].id),
                _ => Transaction::new(TransactionType::Expense, accounts[0].id, date, amount, "USD")
                    .with_category("Food", Some("Groceries".into())),
            }
        })
        .collect()
}

fn build_series(count: usize) -> Vec<RecurringSeries> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|idx| {
            let frequency = match idx % 3 {
                0 => Frequency::Weekly,
                1 => Frequency::Monthly,
                _ => Frequency::Yearly,
            };
            RecurringSeries::new(
                frequency,
                start + Duration::days(idx as i64),
                Decimal::from(20),
                "USD",
                "Media",
                format!("Series {idx}"),
            )
        })
        .collect()
}

fn bench_generation(c: &mut Criterion) {
    let accounts = build_accounts();
    let series = build_series(200);
    let generator = RecurrenceGenerator::new(reference());

    c.bench_function("generate_200_series_12_months", |b| {
        b.iter(|| {
            let delta = generator.generate(&series, &[], &HashSet::new(), &accounts, 12);
            black_box(delta);
        })
    });

    let first = generator.generate(&series, &[], &HashSet::new(), &accounts, 12);
    let ids: HashSet<_> = first.transactions.iter().map(|txn| txn.id).collect();
    c.bench_function("regenerate_200_series_noop", |b| {
        b.iter(|| {
            let delta = generator.generate(&series, &first.occurrences, &ids, &accounts, 12);
            black_box(delta);
        })
    });
}

fn bench_balances_and_summaries(c: &mut Criterion) {
    let accounts = build_accounts();
    let transactions = build_transactions(&accounts, 10_000);

    c.bench_function("balance_replay_10k", |b| {
        b.iter_batched(
            || accounts.clone(),
            |mut accounts| {
                BalanceService::recompute(
                    &mut accounts,
                    &transactions,
                    &IdentityConverter,
                    reference(),
                );
                black_box(accounts);
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("summary_this_year_10k", |b| {
        b.iter(|| {
            let range = TimeFilter::ThisYear.resolve(reference());
            let summary = SummaryService::summarize(
                &transactions,
                range,
                reference(),
                "USD",
                |txn| txn.amount,
            );
            black_box(summary);
        })
    });
}

fn bench_repository_io(c: &mut Criterion) {
    let accounts = build_accounts();
    let transactions = build_transactions(&accounts, 10_000);
    let dir = tempdir().expect("tempdir");
    let repo = JsonRepository::new(Some(dir.path().to_path_buf())).expect("repository");

    c.bench_function("transactions_save_10k", |b| {
        b.iter(|| repo.save_transactions(&transactions).expect("save"))
    });

    c.bench_function("transactions_load_10k", |b| {
        b.iter(|| black_box(repo.load_transactions().expect("load")))
    });
}

criterion_group!(
    benches,
    bench_generation,
    bench_balances_and_summaries,
    bench_repository_io
);
criterion_main!(benches);
