pub mod balance_service;
pub mod filter_service;
pub mod generation_service;
pub mod grouping_service;
pub mod summary_service;
pub mod validation_service;

pub use balance_service::{BalanceService, Direction};
pub use filter_service::{DateRange, FilterService, TimeFilter};
pub use generation_service::{GenerationDelta, RecurrenceGenerator};
pub use grouping_service::{DayGroup, GroupingService};
pub use summary_service::{CategoryExpense, Summary, SummaryService};
pub use validation_service::ValidationService;
