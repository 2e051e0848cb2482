//! Ledger domain models and persistence-friendly types.

pub mod account;
pub mod category;
pub mod frequency;
pub mod recurring;
pub mod settings;
pub mod transaction;

pub use account::Account;
pub use category::{Category, CategoryKind};
pub use frequency::Frequency;
pub use recurring::{RecurringOccurrence, RecurringSeries, SeriesState, SubscriptionStatus};
pub use settings::Settings;
pub use transaction::{Transaction, TransactionType};
