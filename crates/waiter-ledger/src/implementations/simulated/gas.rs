//! Gas schedule and metering for the simulated ledger.
//!
//! The schedule is a small subset of the mainnet one, close enough that gas
//! figures look familiar (a plain transfer costs 21 000) without modelling
//! an interpreter.

use super::contract::Halt;
use waiter_types::Operation;

pub const TX_BASE: u64 = 21_000;
pub const TX_CREATE: u64 = 32_000;
pub const CALLDATA_ZERO_BYTE: u64 = 4;
pub const CALLDATA_NONZERO_BYTE: u64 = 16;
pub const CODE_DEPOSIT_BYTE: u64 = 200;
pub const SLOAD: u64 = 800;
pub const SSTORE_SET: u64 = 20_000;
pub const SSTORE_RESET: u64 = 5_000;
pub const LOG_BASE: u64 = 375;
pub const LOG_TOPIC: u64 = 375;
pub const LOG_DATA_BYTE: u64 = 8;
pub const CALL_VALUE_TRANSFER: u64 = 9_000;

/// Gas charged before execution starts.
pub fn intrinsic_gas(operation: &Operation) -> u64 {
	let calldata: u64 = operation
		.input
		.iter()
		.map(|byte| {
			if *byte == 0 {
				CALLDATA_ZERO_BYTE
			} else {
				CALLDATA_NONZERO_BYTE
			}
		})
		.sum();
	let create = if operation.is_deployment() { TX_CREATE } else { 0 };
	TX_BASE + create + calldata
}

/// Tracks gas consumption against a limit.
#[derive(Debug, Clone)]
pub struct GasMeter {
	limit: u64,
	used: u64,
}

impl GasMeter {
	pub fn new(limit: u64) -> Self {
		Self { limit, used: 0 }
	}

	/// Consumes `amount` gas. Running past the limit consumes the whole limit.
	pub fn charge(&mut self, amount: u64) -> Result<(), Halt> {
		let next = self.used.saturating_add(amount);
		if next > self.limit {
			self.used = self.limit;
			return Err(Halt::OutOfGas);
		}
		self.used = next;
		Ok(())
	}

	pub fn used(&self) -> u64 {
		self.used
	}

	pub fn limit(&self) -> u64 {
		self.limit
	}
}
