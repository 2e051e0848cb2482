pub mod clock;
pub mod coordinator;
pub mod debounce;
pub mod services;
pub mod transaction_store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{CoordinatorBuilder, GenerationReport, RecurringCoordinator};
pub use debounce::CoalescingTask;
pub use transaction_store::TransactionStore;
