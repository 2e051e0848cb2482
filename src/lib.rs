#![doc(test(attr(deny(warnings))))]

//! Finance Core turns recurring-series definitions into dated transactions and
//! keeps balances, summaries and category totals consistent with them.

pub mod cache;
pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod notifications;
pub mod storage;
pub mod utils;

use std::path::Path;
use std::sync::{Arc, Once};

use crate::config::CoreConfig;
use crate::currency::CurrencyConverter;
use crate::ledger::Settings;
use crate::notifications::NotificationScheduler;
use crate::storage::{JsonRepository, Repository};

pub use crate::core::{
    Clock, CoordinatorBuilder, FixedClock, GenerationReport, RecurringCoordinator, SystemClock,
    TransactionStore,
};
pub use errors::{CoreError, ErrorKind, Result};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Core tracing initialized.");
    });
}

/// Opens a JSON-backed coordinator under `base_dir` using `config`.
///
/// The configured base currency seeds the repository settings on first start;
/// afterwards the persisted settings win.
pub fn open(
    config: &CoreConfig,
    base_dir: &Path,
    converter: Arc<dyn CurrencyConverter>,
    clock: Arc<dyn Clock>,
    notifications: Arc<dyn NotificationScheduler>,
) -> Result<RecurringCoordinator> {
    let repository = Arc::new(JsonRepository::new(Some(config.resolve_data_dir(base_dir)))?);
    if !repository.has_settings() {
        repository.save_settings(&Settings {
            base_currency: config.base_currency.clone(),
        })?;
    }
    let mut store = TransactionStore::new(
        repository.clone(),
        converter,
        clock,
        config.cache_capacity,
    );
    store.load()?;
    tracing::info!(data_dir = %repository.root().display(), "opened finance core");
    RecurringCoordinator::builder()
        .store(store)
        .repository(repository)
        .notifications(notifications)
        .horizon_months(config.default_horizon_months)
        .build()
}
