//! Invariant oracle.
//!
//! The `check_*` functions are pure comparisons between what a confirmed
//! operation should have done and what the ledger reports. The
//! [`InvariantOracle`] supplies the ledger side of those comparisons and the
//! [`InvariantReport`] collects their outcomes.

use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;
use tracing::{debug, warn};
use waiter_ledger::{LedgerError, LedgerService};
use waiter_types::{Address, LogEntry, LogFilter, OperationHandle, Receipt};

/// A failed post-confirmation check. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
	#[error("Balance went from {before} to {after}; expected a decrease of {expected}")]
	CostMismatch {
		before: U256,
		after: U256,
		expected: U256,
	},
	#[error("Operation used its whole gas limit of {gas_limit}")]
	ResourceExhausted { gas_limit: u64, gas_used: u64 },
	#[error("{name}: expected {expected}, observed {observed}")]
	CounterMismatch {
		name: String,
		expected: U256,
		observed: U256,
	},
	#[error("{name}: expected {expected}, observed {observed}")]
	FieldMismatch {
		name: String,
		expected: String,
		observed: String,
	},
	#[error("Expected {expected} events, found {observed}")]
	EventCountMismatch { expected: usize, observed: usize },
	#[error("Gas used {gas_used} outside expected range {min}..={max}")]
	GasOutOfRange { gas_used: u64, min: u64, max: u64 },
	#[error("Operation {handle} has the wrong outcome (expected success: {expected_success})")]
	UnexpectedOutcome {
		handle: OperationHandle,
		expected_success: bool,
	},
}

/// `before - after == value + gas_price * gas_used`.
///
/// `value` is what the account parted with for good, excluding anything the
/// contract paid back.
pub fn check_cost_accounting(
	before: U256,
	after: U256,
	value: U256,
	gas_price: u128,
	receipt: &Receipt,
) -> Result<(), InvariantViolation> {
	let expected = value + U256::from(gas_price) * U256::from(receipt.gas_used);
	if before.checked_sub(after) == Some(expected) {
		Ok(())
	} else {
		Err(InvariantViolation::CostMismatch {
			before,
			after,
			expected,
		})
	}
}

/// Flags an operation that consumed its whole gas limit, successful or not.
pub fn check_not_exhausted(gas_limit: u64, receipt: &Receipt) -> Result<(), InvariantViolation> {
	if receipt.gas_used >= gas_limit {
		return Err(InvariantViolation::ResourceExhausted {
			gas_limit,
			gas_used: receipt.gas_used,
		});
	}
	Ok(())
}

pub fn check_counter(
	name: &str,
	expected: U256,
	observed: U256,
) -> Result<(), InvariantViolation> {
	if expected != observed {
		return Err(InvariantViolation::CounterMismatch {
			name: name.to_string(),
			expected,
			observed,
		});
	}
	Ok(())
}

/// Compares any displayable value read back from the ledger.
pub fn check_field<T: PartialEq + fmt::Display>(
	name: &str,
	expected: T,
	observed: T,
) -> Result<(), InvariantViolation> {
	if expected != observed {
		return Err(InvariantViolation::FieldMismatch {
			name: name.to_string(),
			expected: expected.to_string(),
			observed: observed.to_string(),
		});
	}
	Ok(())
}

pub fn check_event_count(expected: usize, logs: &[LogEntry]) -> Result<(), InvariantViolation> {
	if logs.len() != expected {
		return Err(InvariantViolation::EventCountMismatch {
			expected,
			observed: logs.len(),
		});
	}
	Ok(())
}

/// Bounds gas usage; the bounds are chosen per scenario.
pub fn check_gas_range(
	receipt: &Receipt,
	range: RangeInclusive<u64>,
) -> Result<(), InvariantViolation> {
	if !range.contains(&receipt.gas_used) {
		return Err(InvariantViolation::GasOutOfRange {
			gas_used: receipt.gas_used,
			min: *range.start(),
			max: *range.end(),
		});
	}
	Ok(())
}

pub fn check_succeeded(receipt: &Receipt) -> Result<(), InvariantViolation> {
	check_outcome(receipt, true)
}

/// The operation was confirmed but failed.
pub fn check_reverted(receipt: &Receipt) -> Result<(), InvariantViolation> {
	check_outcome(receipt, false)
}

fn check_outcome(receipt: &Receipt, expected_success: bool) -> Result<(), InvariantViolation> {
	if receipt.success != expected_success {
		return Err(InvariantViolation::UnexpectedOutcome {
			handle: receipt.hash,
			expected_success,
		});
	}
	Ok(())
}

/// Outcomes of every check run for one scenario.
///
/// Recording never short-circuits; all violations are kept.
#[derive(Debug, Default)]
pub struct InvariantReport {
	checks: Vec<(String, Result<(), InvariantViolation>)>,
}

impl InvariantReport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, check: impl Into<String>, outcome: Result<(), InvariantViolation>) {
		let check = check.into();
		match &outcome {
			Ok(()) => debug!(check = %check, "Invariant holds"),
			Err(violation) => warn!(check = %check, %violation, "Invariant violated"),
		}
		self.checks.push((check, outcome));
	}

	pub fn len(&self) -> usize {
		self.checks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.checks.is_empty()
	}

	pub fn passed(&self) -> usize {
		self.checks.iter().filter(|(_, outcome)| outcome.is_ok()).count()
	}

	pub fn violations(&self) -> impl Iterator<Item = (&str, &InvariantViolation)> {
		self.checks
			.iter()
			.filter_map(|(check, outcome)| outcome.as_ref().err().map(|v| (check.as_str(), v)))
	}

	pub fn is_clean(&self) -> bool {
		self.violations().next().is_none()
	}

	pub fn into_result(self) -> Result<(), Vec<InvariantViolation>> {
		let violations: Vec<_> = self
			.checks
			.into_iter()
			.filter_map(|(_, outcome)| outcome.err())
			.collect();
		if violations.is_empty() {
			Ok(())
		} else {
			Err(violations)
		}
	}
}

/// Fresh ledger reads for the checks above.
#[derive(Clone)]
pub struct InvariantOracle {
	ledger: LedgerService,
}

impl InvariantOracle {
	pub fn new(ledger: LedgerService) -> Self {
		Self { ledger }
	}

	pub async fn balance_of(&self, account: Address) -> Result<U256, LedgerError> {
		self.ledger.balance(account).await
	}

	/// Reads a `uint256` view function of a contract.
	pub async fn counter<C: SolCall>(&self, contract: Address, call: &C) -> Result<U256, LedgerError> {
		self.ledger.counter(contract, call).await
	}

	pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError> {
		self.ledger.logs(filter).await
	}

	/// Reads the counter and compares it in one step.
	pub async fn expect_counter<C: SolCall>(
		&self,
		contract: Address,
		call: &C,
		expected: U256,
	) -> Result<Result<(), InvariantViolation>, LedgerError> {
		let observed = self.counter(contract, call).await?;
		Ok(check_counter(C::SIGNATURE, expected, observed))
	}

	/// Queries the logs and compares their number in one step.
	pub async fn expect_event_count(
		&self,
		filter: &LogFilter,
		expected: usize,
	) -> Result<Result<(), InvariantViolation>, LedgerError> {
		let logs = self.logs(filter).await?;
		Ok(check_event_count(expected, &logs))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use waiter_ledger::breeding::{spawn_call, spawn_topic, IBreedingToken};
	use waiter_ledger::implementations::simulated::{token, SimulatedLedger};
	use waiter_ledger::LedgerInterface;
	use waiter_types::{Denomination, Operation, OperationStatus, B256};

	fn receipt(gas_used: u64, success: bool) -> Receipt {
		Receipt {
			hash: OperationHandle(B256::repeat_byte(7)),
			block_number: 3,
			gas_used,
			success,
			contract_address: None,
			effective_gas_price: 2,
		}
	}

	#[test]
	fn test_cost_accounting() {
		let receipt = receipt(50_000, true);
		let value = Denomination::Finney.amount(5);
		let before = Denomination::Ether.amount(1);
		let after = before - value - U256::from(100_000u64);

		assert!(check_cost_accounting(before, after, value, 2, &receipt).is_ok());
		assert!(check_cost_accounting(before, after + U256::from(1u64), value, 2, &receipt).is_err());
		// A balance that grew is a mismatch, not an underflow.
		assert!(matches!(
			check_cost_accounting(before, before + U256::from(1u64), value, 2, &receipt),
			Err(InvariantViolation::CostMismatch { .. })
		));
	}

	#[test]
	fn test_exhaustion_flagged_regardless_of_success() {
		assert!(check_not_exhausted(200_000, &receipt(199_999, true)).is_ok());
		assert!(check_not_exhausted(200_000, &receipt(200_000, true)).is_err());
		assert_eq!(
			check_not_exhausted(40_000, &receipt(40_000, false)),
			Err(InvariantViolation::ResourceExhausted {
				gas_limit: 40_000,
				gas_used: 40_000
			})
		);
	}

	#[test]
	fn test_gas_range_and_outcome() {
		let failed = receipt(25_000, false);
		assert!(check_gas_range(&failed, 0..=30_000).is_ok());
		assert!(check_gas_range(&failed, 50_000..=u64::MAX).is_err());
		assert!(check_reverted(&failed).is_ok());
		assert!(check_succeeded(&failed).is_err());
	}

	#[test]
	fn test_field_comparison() {
		assert!(check_field("name", "Jack", "Jack").is_ok());
		assert_eq!(
			check_field("owner", Address::ZERO, Address::repeat_byte(1)),
			Err(InvariantViolation::FieldMismatch {
				name: "owner".to_string(),
				expected: Address::ZERO.to_string(),
				observed: Address::repeat_byte(1).to_string(),
			})
		);
	}

	#[test]
	fn test_report_keeps_every_violation() {
		let mut report = InvariantReport::new();
		report.record("supply", check_counter("totalSupply", U256::from(1u64), U256::from(1u64)));
		report.record("events", check_event_count(10, &[]));
		report.record("gas", check_not_exhausted(21_000, &receipt(21_000, true)));

		assert_eq!(report.len(), 3);
		assert_eq!(report.passed(), 1);
		assert!(!report.is_clean());
		let names: Vec<_> = report.violations().map(|(name, _)| name).collect();
		assert_eq!(names, vec!["events", "gas"]);
		assert_eq!(report.into_result().unwrap_err().len(), 2);
	}

	#[tokio::test]
	async fn test_oracle_reads_simulated_ledger() {
		let alice = Address::repeat_byte(0xaa);
		let backend = Arc::new(SimulatedLedger::new([(alice, Denomination::Ether.amount(1))]));
		let oracle = InvariantOracle::new(LedgerService::new(backend.clone()));

		let deploy = backend
			.submit(Operation::deploy(alice, token::CREATION_CODE))
			.await
			.unwrap();
		backend.advance().await.unwrap();
		let contract = match backend.status(&deploy).await.unwrap() {
			OperationStatus::Finalized(receipt) => receipt.contract_address.unwrap(),
			OperationStatus::Pending => panic!("deployment still pending"),
		};

		for name in ["Jack", "Mary"] {
			backend
				.submit(
					Operation::call(alice, contract, spawn_call(name, 1))
						.with_value(Denomination::Finney.amount(1)),
				)
				.await
				.unwrap();
		}
		backend.advance().await.unwrap();

		let supply = oracle
			.expect_counter(contract, &IBreedingToken::totalSupplyCall {}, U256::from(2u64))
			.await
			.unwrap();
		assert!(supply.is_ok());

		let filter = LogFilter::new()
			.address(contract)
			.event_signature(spawn_topic())
			.topic1_any([alice.into_word()]);
		assert!(oracle.expect_event_count(&filter, 2).await.unwrap().is_ok());
		assert_eq!(
			oracle.balance_of(contract).await.unwrap(),
			Denomination::Finney.amount(2)
		);
	}
}
