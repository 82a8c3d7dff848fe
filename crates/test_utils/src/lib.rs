//! Test Utilities Crate
//!
//! Shared fixtures and helpers for the billing test suites.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built rate cards, periods, and contracts
//! - `builders`: Builder for call records with sensible defaults
//! - `assertions`: Assertion helpers for bills
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
