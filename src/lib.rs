// Expense Tracker - Core Library
// Exposes the record store and view projection for the TUI binary and tests

pub mod store;
pub mod view;

// Re-export commonly used types
pub use store::{format_amount, validate_date, ExpenseStore, Record, ValidationError, CATEGORIES};
pub use view::{DisplayRow, SortColumn, SortState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
