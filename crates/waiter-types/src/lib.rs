//! Shared types for the ledger confirmation waiter.
//!
//! Everything that crosses a crate boundary lives here: operation handles and
//! receipts, waiter events, log entries and filters, denomination arithmetic and the schema
//! used to validate ledger backend configuration.

pub mod events;
pub mod logs;
pub mod operation;
pub mod units;
pub mod validation;

pub use events::*;
pub use logs::*;
pub use operation::*;
pub use units::*;
pub use validation::*;

pub use alloy_primitives::{Address, Bytes, B256, U256};
