//! Contract model of the simulated ledger.
//!
//! Contracts are native Rust objects rather than bytecode. They meter
//! themselves through the [`CallContext`], which also buffers the logs and
//! value transfers of a call so the ledger can discard them on a revert.

use super::gas::{self, GasMeter};
use alloy_primitives::{Address, Bytes, LogData, U256};

/// Why execution stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
	/// The gas limit was reached; the whole limit is consumed.
	OutOfGas,
	/// The contract rejected the call; unused gas is refunded.
	Revert(String),
}

impl Halt {
	pub fn revert(reason: impl Into<String>) -> Self {
		Halt::Revert(reason.into())
	}
}

/// Execution environment of a single call.
#[derive(Debug)]
pub struct CallContext {
	/// Account that sent the operation.
	pub caller: Address,
	/// Value attached to the operation, already credited to `this`.
	pub value: U256,
	/// Address of the executing contract.
	pub this: Address,
	meter: GasMeter,
	logs: Vec<LogData>,
	payouts: Vec<(Address, U256)>,
}

impl CallContext {
	pub fn new(caller: Address, value: U256, this: Address, meter: GasMeter) -> Self {
		Self {
			caller,
			value,
			this,
			meter,
			logs: Vec::new(),
			payouts: Vec::new(),
		}
	}

	pub fn charge(&mut self, amount: u64) -> Result<(), Halt> {
		self.meter.charge(amount)
	}

	/// Charges a storage read.
	pub fn sload(&mut self) -> Result<(), Halt> {
		self.charge(gas::SLOAD)
	}

	/// Charges a storage write; `fresh` slots go from zero to non-zero.
	pub fn sstore(&mut self, fresh: bool) -> Result<(), Halt> {
		self.charge(if fresh {
			gas::SSTORE_SET
		} else {
			gas::SSTORE_RESET
		})
	}

	/// Emits a log from the executing contract.
	pub fn emit(&mut self, log: LogData) -> Result<(), Halt> {
		let cost = gas::LOG_BASE
			+ gas::LOG_TOPIC * log.topics().len() as u64
			+ gas::LOG_DATA_BYTE * log.data.len() as u64;
		self.charge(cost)?;
		self.logs.push(log);
		Ok(())
	}

	/// Sends `amount` out of the executing contract's balance.
	pub fn transfer(&mut self, to: Address, amount: U256) -> Result<(), Halt> {
		self.charge(gas::CALL_VALUE_TRANSFER)?;
		self.payouts.push((to, amount));
		Ok(())
	}

	pub fn gas_used(&self) -> u64 {
		self.meter.used()
	}

	/// Splits the context into the effects it buffered.
	pub fn into_effects(self) -> (u64, Vec<LogData>, Vec<(Address, U256)>) {
		(self.meter.used(), self.logs, self.payouts)
	}
}

/// A contract living on the simulated ledger.
pub trait SimulatedContract: Send + Sync {
	/// Executes a state-changing call. Effects are committed only on `Ok`.
	fn execute(&mut self, ctx: &mut CallContext, input: &[u8]) -> Result<Bytes, Halt>;

	/// Executes a read-only call against the current state.
	fn view(&self, input: &[u8]) -> Result<Bytes, Halt>;

	/// Copies the contract so a call can run against a scratch instance.
	fn boxed_clone(&self) -> Box<dyn SimulatedContract>;
}

/// Constructor registered for a piece of creation code.
///
/// Runs with the deployment's context, so constructors pay for the storage
/// they initialise.
pub type ContractFactory = fn(&mut CallContext) -> Result<Box<dyn SimulatedContract>, Halt>;
