//! In-memory simulated ledger.
//!
//! Operations are accepted into a pending pool by `submit` and only executed
//! when `advance` seals a block, one block per call, mirroring how a
//! development chain is driven from tests. Execution is metered and honours
//! revert and out-of-gas semantics so that receipts carry realistic outcomes.

pub mod contract;
pub mod gas;
pub mod token;

use self::contract::{CallContext, ContractFactory, Halt, SimulatedContract};
use self::gas::GasMeter;
use crate::{LedgerError, LedgerInterface, SubmissionError};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use waiter_types::{
	deserialize_amount, ConfigSchema, Field, FieldType, LogEntry, LogFilter, Operation,
	OperationHandle, OperationStatus, Receipt, Schema, ValidationError,
};

/// Gas price suggested when none is configured.
pub const DEFAULT_GAS_PRICE: u128 = 1;

struct PendingOperation {
	handle: OperationHandle,
	nonce: u64,
	operation: Operation,
}

#[derive(Default)]
struct ChainState {
	block_number: u64,
	balances: HashMap<Address, U256>,
	nonces: HashMap<Address, u64>,
	code: HashMap<Address, Bytes>,
	contracts: HashMap<Address, Box<dyn SimulatedContract>>,
	pending: Vec<PendingOperation>,
	receipts: HashMap<OperationHandle, Receipt>,
	logs: Vec<LogEntry>,
}

impl ChainState {
	fn balance(&self, account: &Address) -> U256 {
		self.balances.get(account).copied().unwrap_or_default()
	}

	fn credit(&mut self, account: Address, amount: U256) {
		*self.balances.entry(account).or_default() += amount;
	}

	fn debit(&mut self, account: Address, amount: U256) {
		let balance = self.balances.entry(account).or_default();
		*balance = balance.saturating_sub(amount);
	}

	/// Funds already promised to pending operations of `account`.
	fn reserved(&self, account: &Address) -> Option<U256> {
		self.pending
			.iter()
			.filter(|p| p.operation.from == *account)
			.try_fold(U256::ZERO, |acc, p| acc.checked_add(p.operation.upfront_cost()?))
	}
}

/// Simulated ledger backend.
pub struct SimulatedLedger {
	state: RwLock<ChainState>,
	artifacts: HashMap<B256, ContractFactory>,
	gas_price: u128,
}

impl SimulatedLedger {
	/// Creates a ledger whose genesis block funds the given accounts.
	///
	/// The breeding token artifact is registered up front.
	pub fn new(genesis: impl IntoIterator<Item = (Address, U256)>) -> Self {
		let state = ChainState {
			balances: genesis.into_iter().collect(),
			..Default::default()
		};
		let mut ledger = Self {
			state: RwLock::new(state),
			artifacts: HashMap::new(),
			gas_price: DEFAULT_GAS_PRICE,
		};
		ledger.register_artifact(token::CREATION_CODE, token::BreedingToken::deploy);
		ledger
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = gas_price;
		self
	}

	/// Associates creation code with a native contract constructor.
	///
	/// Deploying unregistered code still creates an account holding that
	/// code, but calls to it behave like plain transfers.
	pub fn register_artifact(&mut self, code: &[u8], factory: ContractFactory) {
		self.artifacts.insert(keccak256(code), factory);
	}

	/// Number of operations waiting for the next block.
	pub async fn pending_count(&self) -> usize {
		self.state.read().await.pending.len()
	}

	fn operation_hash(operation: &Operation, nonce: u64) -> B256 {
		let mut preimage = Vec::with_capacity(128 + operation.input.len());
		preimage.extend_from_slice(operation.from.as_slice());
		preimage.extend_from_slice(&nonce.to_be_bytes());
		preimage.extend_from_slice(operation.to.unwrap_or_default().as_slice());
		preimage.extend_from_slice(&operation.value.to_be_bytes::<32>());
		preimage.extend_from_slice(&operation.gas_limit.to_be_bytes());
		preimage.extend_from_slice(&operation.gas_price.to_be_bytes());
		preimage.extend_from_slice(&operation.input);
		keccak256(preimage)
	}

	/// Executes one operation against the state and returns its receipt.
	fn execute(&self, state: &mut ChainState, pending: PendingOperation, block_number: u64) -> Receipt {
		let PendingOperation {
			handle,
			nonce,
			operation,
		} = pending;
		let gas_price = U256::from(operation.gas_price);
		let max_fee = U256::from(operation.gas_limit) * gas_price;
		state.debit(operation.from, max_fee);

		let target = operation
			.to
			.unwrap_or_else(|| operation.from.create(nonce));
		let mut ctx = CallContext::new(
			operation.from,
			operation.value,
			target,
			GasMeter::new(operation.gas_limit),
		);

		let outcome = ctx
			.charge(gas::intrinsic_gas(&operation))
			.and_then(|()| match operation.to {
				None => self.run_deployment(state, &mut ctx, &operation.input),
				Some(to) => match state.contracts.get(&to) {
					Some(contract) => {
						let mut scratch = contract.boxed_clone();
						scratch
							.execute(&mut ctx, &operation.input)
							.map(|_| Some(scratch))
					}
					None => Ok(None),
				},
			});

		let (gas_used, logs, payouts) = ctx.into_effects();
		let success = match outcome {
			Ok(updated) => {
				state.debit(operation.from, operation.value);
				state.credit(target, operation.value);
				for (to, amount) in payouts {
					state.debit(target, amount);
					state.credit(to, amount);
				}
				if let Some(contract) = updated {
					state.contracts.insert(target, contract);
				}
				for log in logs {
					state.logs.push(LogEntry {
						address: target,
						topics: log.topics().to_vec(),
						data: log.data,
						block_number,
						transaction_hash: handle,
					});
				}
				true
			}
			Err(halt) => {
				debug!(tx_hash = %handle.short(), ?halt, "Operation halted");
				false
			}
		};

		// Out-of-gas leaves gas_used at the limit, so nothing is refunded.
		let refund = U256::from(operation.gas_limit - gas_used) * gas_price;
		state.credit(operation.from, refund);

		Receipt {
			hash: handle,
			block_number,
			gas_used,
			success,
			contract_address: operation.to.is_none().then_some(target).filter(|_| success),
			effective_gas_price: operation.gas_price,
		}
	}

	fn run_deployment(
		&self,
		state: &mut ChainState,
		ctx: &mut CallContext,
		code: &Bytes,
	) -> Result<Option<Box<dyn SimulatedContract>>, Halt> {
		ctx.charge(gas::CODE_DEPOSIT_BYTE * code.len() as u64)?;
		let contract = match self.artifacts.get(&keccak256(code)) {
			Some(factory) => Some(factory(ctx)?),
			None => None,
		};
		state.code.insert(ctx.this, code.clone());
		Ok(contract)
	}
}

#[async_trait]
impl LedgerInterface for SimulatedLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(SimulatedLedgerSchema)
	}

	async fn submit(&self, operation: Operation) -> Result<OperationHandle, LedgerError> {
		let mut state = self.state.write().await;

		let expected = state.nonces.get(&operation.from).copied().unwrap_or(0);
		if let Some(provided) = operation.nonce {
			if provided != expected {
				return Err(SubmissionError::NonceMismatch { expected, provided }.into());
			}
		}

		let required_gas = gas::intrinsic_gas(&operation);
		if operation.gas_limit < required_gas {
			return Err(SubmissionError::IntrinsicGasTooLow {
				gas_limit: operation.gas_limit,
				required: required_gas,
			}
			.into());
		}

		let required = operation
			.upfront_cost()
			.ok_or(SubmissionError::CostOverflow)?;
		let reserved = state
			.reserved(&operation.from)
			.ok_or(SubmissionError::CostOverflow)?;
		let balance = state.balance(&operation.from).saturating_sub(reserved);
		if balance < required {
			return Err(SubmissionError::InsufficientFunds { balance, required }.into());
		}

		let handle = OperationHandle(Self::operation_hash(&operation, expected));
		state.nonces.insert(operation.from, expected + 1);
		state.pending.push(PendingOperation {
			handle,
			nonce: expected,
			operation,
		});
		debug!(tx_hash = %handle.short(), nonce = expected, "Accepted operation into pending pool");
		Ok(handle)
	}

	async fn status(&self, handle: &OperationHandle) -> Result<OperationStatus, LedgerError> {
		let state = self.state.read().await;
		if let Some(receipt) = state.receipts.get(handle) {
			return Ok(OperationStatus::Finalized(receipt.clone()));
		}
		if state.pending.iter().any(|p| p.handle == *handle) {
			return Ok(OperationStatus::Pending);
		}
		Err(LedgerError::UnknownOperation(*handle))
	}

	async fn balance(&self, account: Address) -> Result<U256, LedgerError> {
		Ok(self.state.read().await.balance(&account))
	}

	async fn code_at(&self, address: Address) -> Result<Bytes, LedgerError> {
		Ok(self
			.state
			.read()
			.await
			.code
			.get(&address)
			.cloned()
			.unwrap_or_default())
	}

	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError> {
		let state = self.state.read().await;
		match state.contracts.get(&to) {
			Some(contract) => contract.view(&input).map_err(|halt| match halt {
				Halt::Revert(reason) => LedgerError::Call(format!("execution reverted: {}", reason)),
				Halt::OutOfGas => LedgerError::Call("out of gas".to_string()),
			}),
			None => Ok(Bytes::new()),
		}
	}

	async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError> {
		let state = self.state.read().await;
		Ok(state
			.logs
			.iter()
			.filter(|log| filter.matches(log))
			.cloned()
			.collect())
	}

	async fn gas_price(&self) -> Result<u128, LedgerError> {
		Ok(self.gas_price)
	}

	async fn advance(&self) -> Result<u64, LedgerError> {
		let mut state = self.state.write().await;
		state.block_number += 1;
		let block_number = state.block_number;

		let pending = std::mem::take(&mut state.pending);
		let included = pending.len();
		for operation in pending {
			let receipt = self.execute(&mut state, operation, block_number);
			state.receipts.insert(receipt.hash, receipt);
		}

		info!(block = block_number, operations = included, "Sealed block");
		Ok(block_number)
	}
}

/// Configuration schema for the simulated ledger.
pub struct SimulatedLedgerSchema;

impl ConfigSchema for SimulatedLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new(
				"genesis",
				FieldType::Array(Box::new(FieldType::Table(Schema::new(
					vec![
						Field::new("address", FieldType::Address),
						Field::new("balance", FieldType::Amount),
					],
					vec![],
				)))),
			)],
			// Optional fields
			vec![Field::new(
				"gas_price",
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			)],
		);

		schema.validate(config)
	}
}

#[derive(serde::Deserialize)]
struct GenesisAccount {
	address: Address,
	#[serde(deserialize_with = "deserialize_amount")]
	balance: U256,
}

#[derive(serde::Deserialize)]
struct SimulatedLedgerConfig {
	genesis: Vec<GenesisAccount>,
	gas_price: Option<u64>,
}

/// Factory function to create a simulated ledger from configuration.
///
/// Configuration parameters:
/// - `genesis`: array of `{ address, balance }` funded at block zero
/// - `gas_price`: suggested gas price in wei (default: 1)
pub fn create_simulated_ledger(config: &toml::Value) -> Result<SimulatedLedger, LedgerError> {
	let parsed: SimulatedLedgerConfig = config
		.clone()
		.try_into()
		.map_err(|e| LedgerError::Config(format!("Invalid simulated ledger config: {}", e)))?;

	let genesis = parsed
		.genesis
		.into_iter()
		.map(|account| (account.address, account.balance));
	let gas_price = parsed.gas_price.map_or(DEFAULT_GAS_PRICE, u128::from);

	Ok(SimulatedLedger::new(genesis).with_gas_price(gas_price))
}
