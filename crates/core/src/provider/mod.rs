//! Voice call provider abstraction.
//!
//! The `CallProvider` trait covers the three provider endpoints we use:
//! starting a call, reading an execution's status and reading its log.

mod bolna;
mod types;

pub use bolna::BolnaClient;
pub use types::*;
