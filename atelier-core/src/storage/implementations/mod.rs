//! Storage implementations
//!
//! - `memory/` - In-memory stores for tests and dry runs
//! - `mock/` - Wrappers that inject failures, count calls and gate writes
//!
//! Hosted implementations live in the provider crate.

pub mod memory;
pub mod mock;
