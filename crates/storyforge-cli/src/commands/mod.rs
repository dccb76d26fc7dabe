//! Command implementations.

pub mod config;
pub mod extract;
pub mod test_cases;

pub use config::execute_config;
pub use extract::execute_extract;
pub use test_cases::execute_test_cases;
