//! Operation submission and confirmation types.
//!
//! An [`Operation`] is what a caller hands to the ledger. The ledger answers
//! with an [`OperationHandle`], which is later resolved into a [`Receipt`] (or,
//! for deployments, a [`DeployedAddress`]) once the operation is finalized.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gas limit used by [`Operation::call`] unless overridden.
pub const DEFAULT_CALL_GAS_LIMIT: u64 = 200_000;

/// Gas limit used by [`Operation::deploy`] unless overridden.
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 3_000_000;

/// Opaque reference to a submitted operation.
///
/// Wraps the 32-byte operation hash. Handles are immutable once issued and are
/// only ever read by the confirmation machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(pub B256);

impl OperationHandle {
	/// Truncated hex form used in log lines.
	pub fn short(&self) -> String {
		let hash_str = hex::encode(self.0);
		format!("{}..", &hash_str[..8])
	}
}

impl From<B256> for OperationHandle {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

impl fmt::Display for OperationHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

/// A state-changing request submitted to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
	/// Sending account. Pays the value and the gas fee.
	pub from: Address,
	/// Recipient address (None for contract creation).
	pub to: Option<Address>,
	/// Value to transfer in wei.
	pub value: U256,
	/// Calldata, or creation code for deployments.
	pub input: Bytes,
	/// Maximum gas the operation may consume.
	pub gas_limit: u64,
	/// Price paid per unit of gas, in wei.
	pub gas_price: u128,
	/// Explicit nonce. Filled in by the ledger when absent.
	pub nonce: Option<u64>,
}

impl Operation {
	/// Creates a contract call with no value attached.
	pub fn call(from: Address, to: Address, input: impl Into<Bytes>) -> Self {
		Self {
			from,
			to: Some(to),
			value: U256::ZERO,
			input: input.into(),
			gas_limit: DEFAULT_CALL_GAS_LIMIT,
			gas_price: 1,
			nonce: None,
		}
	}

	/// Creates a plain value transfer.
	pub fn transfer(from: Address, to: Address, value: U256) -> Self {
		Self::call(from, to, Bytes::new()).with_value(value)
	}

	/// Creates a contract deployment carrying the given creation code.
	pub fn deploy(from: Address, code: impl Into<Bytes>) -> Self {
		Self {
			from,
			to: None,
			value: U256::ZERO,
			input: code.into(),
			gas_limit: DEFAULT_DEPLOY_GAS_LIMIT,
			gas_price: 1,
			nonce: None,
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = gas_limit;
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = gas_price;
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = Some(nonce);
		self
	}

	pub fn is_deployment(&self) -> bool {
		self.to.is_none()
	}

	/// Maximum amount the sender can be charged: `value + gas_limit * gas_price`.
	///
	/// `None` when the sum does not fit in 256 bits.
	pub fn upfront_cost(&self) -> Option<U256> {
		U256::from(self.gas_limit)
			.checked_mul(U256::from(self.gas_price))
			.and_then(|fee| fee.checked_add(self.value))
	}
}

/// Finalized outcome of an operation.
///
/// A receipt exists for every finalized operation, including ones whose
/// execution reverted or ran out of gas; `success` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
	/// The handle of the confirmed operation.
	pub hash: OperationHandle,
	/// The block the operation was included in.
	pub block_number: u64,
	/// Gas consumed by execution.
	pub gas_used: u64,
	/// Whether execution completed without reverting.
	pub success: bool,
	/// Address of the created contract, for deployments.
	pub contract_address: Option<Address>,
	/// Price actually paid per unit of gas.
	pub effective_gas_price: u128,
}

impl Receipt {
	/// Total fee charged for the gas this operation used.
	pub fn fee(&self) -> U256 {
		U256::from(self.gas_used) * U256::from(self.effective_gas_price)
	}
}

/// Ledger-side status of a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
	/// Accepted but not yet included in a block.
	Pending,
	/// Included in a block; execution outcome is known.
	Finalized(Receipt),
}

impl OperationStatus {
	pub fn is_finalized(&self) -> bool {
		matches!(self, OperationStatus::Finalized(_))
	}
}

/// Location of a contract whose deployment has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedAddress {
	pub address: Address,
	/// The deployment operation that created it.
	pub handle: OperationHandle,
}

impl fmt::Display for DeployedAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.address)
	}
}
