//! Ledger client module for the confirmation waiter.
//!
//! This module defines the boundary to the external system of record: the
//! [`LedgerInterface`] trait that backends implement, and the
//! [`LedgerService`] wrapper that adds logging and typed contract queries on
//! top of it. Two backends ship with the crate: an in-memory simulated ledger
//! and an alloy JSON-RPC client.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use waiter_types::{
	ConfigSchema, LogEntry, LogFilter, Operation, OperationHandle, OperationStatus,
};

pub mod breeding;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod simulated;
}

/// Reasons the ledger refuses an operation before accepting it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
	#[error("Insufficient funds: balance {balance}, required {required}")]
	InsufficientFunds { balance: U256, required: U256 },
	#[error("Intrinsic gas too low: limit {gas_limit}, required {required}")]
	IntrinsicGasTooLow { gas_limit: u64, required: u64 },
	#[error("Cost overflow: value plus gas limit times price exceeds 256 bits")]
	CostOverflow,
	#[error("Nonce mismatch: expected {expected}, got {provided}")]
	NonceMismatch { expected: u64, provided: u64 },
	#[error("Rejected by node: {0}")]
	Rejected(String),
}

/// Errors that can occur while talking to a ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
	#[error("Operation rejected: {0}")]
	Rejected(#[from] SubmissionError),
	#[error("Network error: {0}")]
	Network(String),
	#[error("Unknown operation: {0}")]
	UnknownOperation(OperationHandle),
	#[error("Call failed: {0}")]
	Call(String),
	#[error("Decode error: {0}")]
	Decode(String),
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Trait defining the interface to a ledger backend.
///
/// Everything except [`submit`](Self::submit) and [`advance`](Self::advance)
/// is a read-only query. Backends own their own consistency; callers never
/// lock around them.
#[async_trait]
pub trait LedgerInterface: Send + Sync {
	/// Schema of the TOML table this backend is configured from.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Submits an operation and returns its handle once accepted.
	async fn submit(&self, operation: Operation) -> Result<OperationHandle, LedgerError>;

	/// Current status of a previously submitted operation.
	async fn status(&self, handle: &OperationHandle) -> Result<OperationStatus, LedgerError>;

	/// Balance of an account in wei.
	async fn balance(&self, account: Address) -> Result<U256, LedgerError>;

	/// Code stored at an address; empty for plain accounts.
	async fn code_at(&self, address: Address) -> Result<Bytes, LedgerError>;

	/// Executes a read-only call against the latest state.
	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError>;

	/// Logs matching the filter, in block order.
	async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError>;

	/// Suggested gas price in wei.
	async fn gas_price(&self) -> Result<u128, LedgerError>;

	/// Processes pending operations into a new block and returns its number.
	async fn advance(&self) -> Result<u64, LedgerError>;
}

/// High-level ledger service used by scenarios and the invariant oracle.
///
/// Wraps a backend with diagnostics and ABI-typed contract queries. Cloning
/// is cheap; clones share the backend.
#[derive(Clone)]
pub struct LedgerService {
	backend: Arc<dyn LedgerInterface>,
}

impl LedgerService {
	pub fn new(backend: Arc<dyn LedgerInterface>) -> Self {
		Self { backend }
	}

	/// The shared backend, for components that spawn their own tasks.
	pub fn backend(&self) -> Arc<dyn LedgerInterface> {
		self.backend.clone()
	}

	pub async fn submit(&self, operation: Operation) -> Result<OperationHandle, LedgerError> {
		let deployment = operation.is_deployment();
		let handle = self.backend.submit(operation).await?;
		info!(tx_hash = %handle.short(), deployment, "Submitted operation");
		Ok(handle)
	}

	pub async fn advance(&self) -> Result<u64, LedgerError> {
		let block = self.backend.advance().await?;
		debug!(block, "Advanced ledger");
		Ok(block)
	}

	pub async fn status(&self, handle: &OperationHandle) -> Result<OperationStatus, LedgerError> {
		self.backend.status(handle).await
	}

	pub async fn balance(&self, account: Address) -> Result<U256, LedgerError> {
		self.backend.balance(account).await
	}

	pub async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError> {
		self.backend.logs(filter).await
	}

	pub async fn gas_price(&self) -> Result<u128, LedgerError> {
		self.backend.gas_price().await
	}

	/// Runs a typed read-only call and returns the raw ABI-encoded output.
	pub async fn call<C: SolCall>(&self, contract: Address, call: &C) -> Result<Bytes, LedgerError> {
		self.backend.call(contract, call.abi_encode().into()).await
	}

	/// Reads a `uint256` value (a counter, a balance, a fee) from a contract.
	pub async fn counter<C: SolCall>(&self, contract: Address, call: &C) -> Result<U256, LedgerError> {
		let output = self.call(contract, call).await?;
		<(U256,)>::abi_decode_params(&output)
			.map(|(value,)| value)
			.map_err(|e| LedgerError::Decode(format!("{}: {}", C::SIGNATURE, e)))
	}

	/// Reads a `string` value from a contract.
	pub async fn text<C: SolCall>(&self, contract: Address, call: &C) -> Result<String, LedgerError> {
		let output = self.call(contract, call).await?;
		<(String,)>::abi_decode_params(&output)
			.map(|(value,)| value)
			.map_err(|e| LedgerError::Decode(format!("{}: {}", C::SIGNATURE, e)))
	}
}

/// Builds a ledger backend from its configuration table.
///
/// `backend` selects the implementation (`"simulated"` or `"rpc"`); `config`
/// is the backend's own table, already validated against its schema.
pub fn create_ledger(
	backend: &str,
	config: &toml::Value,
) -> Result<Arc<dyn LedgerInterface>, LedgerError> {
	match backend {
		"simulated" => Ok(Arc::new(implementations::simulated::create_simulated_ledger(
			config,
		)?)),
		"rpc" => Ok(Arc::new(implementations::evm::alloy::create_rpc_ledger(
			config,
		)?)),
		other => Err(LedgerError::Config(format!(
			"Unknown ledger backend: {}",
			other
		))),
	}
}

/// Schema for a backend's configuration table, if the backend exists.
pub fn ledger_schema(backend: &str) -> Option<Box<dyn ConfigSchema>> {
	match backend {
		"simulated" => Some(Box::new(implementations::simulated::SimulatedLedgerSchema)),
		"rpc" => Some(Box::new(implementations::evm::alloy::AlloyLedgerSchema)),
		_ => None,
	}
}
