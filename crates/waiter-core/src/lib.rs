//! Confirmation waiting and post-confirmation checks.
//!
//! The [`ConfirmationWaiter`] turns "submitted" into "durably confirmed or
//! failed by deadline", and the [`InvariantOracle`] verifies the state change
//! a confirmed operation was supposed to make.

use std::time::Duration;
use thiserror::Error;
use waiter_ledger::LedgerError;
use waiter_types::{Address, OperationHandle};

pub mod confirmation;
pub mod event_bus;
pub mod oracle;
pub mod waiter;

pub use confirmation::{Confirmation, Deployed, Mined};
pub use event_bus::EventBus;
pub use oracle::{InvariantOracle, InvariantReport, InvariantViolation};
pub use waiter::{ConfirmationWaiter, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

/// Errors produced while waiting for an operation.
#[derive(Debug, Error)]
pub enum WaitError {
	/// The deadline passed before the operation was finalized. Fatal to the run.
	#[error("Operation {handle} was not confirmed within {after:?}")]
	Timeout {
		handle: OperationHandle,
		after: Duration,
	},
	#[error("Ledger query failed: {0}")]
	Ledger(#[from] LedgerError),
	/// The watch task ended without reporting an outcome.
	#[error("Watch task for {0} ended without reporting")]
	WatchAborted(OperationHandle),
	#[error("No contract code at {0} after deployment")]
	NoCode(Address),
	#[error("Operation {0} did not create a contract")]
	NotADeployment(OperationHandle),
	#[error("Deployment {0} was confirmed but reverted")]
	DeploymentReverted(OperationHandle),
}

impl WaitError {
	/// Whether the error must abort the whole run rather than the current step.
	pub fn is_fatal(&self) -> bool {
		matches!(self, WaitError::Timeout { .. })
	}

	/// Whether a watch task should keep polling after this error. Failed
	/// queries are retried until the caller's deadline.
	pub fn is_transient(&self) -> bool {
		matches!(self, WaitError::Ledger(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use waiter_types::B256;

	#[test]
	fn test_only_timeout_is_fatal() {
		let handle = OperationHandle(B256::ZERO);
		assert!(WaitError::Timeout {
			handle,
			after: Duration::from_secs(20)
		}
		.is_fatal());
		assert!(!WaitError::WatchAborted(handle).is_fatal());
		assert!(!WaitError::Ledger(LedgerError::Network("down".into())).is_fatal());
		assert!(!WaitError::NoCode(Address::ZERO).is_fatal());
	}

	#[test]
	fn test_only_ledger_queries_are_retried() {
		let handle = OperationHandle(B256::ZERO);
		assert!(WaitError::Ledger(LedgerError::UnknownOperation(handle)).is_transient());
		assert!(!WaitError::DeploymentReverted(handle).is_transient());
		assert!(!WaitError::NoCode(Address::ZERO).is_transient());
		assert!(!WaitError::Timeout {
			handle,
			after: Duration::from_secs(20)
		}
		.is_transient());
	}
}
