// Public modules
pub mod binder;
pub mod engine;
pub mod env;
pub mod error;
pub mod registry;
pub mod requires;
pub mod segment;
pub mod signal;
pub mod tasks;
pub mod unit;
pub mod units;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
