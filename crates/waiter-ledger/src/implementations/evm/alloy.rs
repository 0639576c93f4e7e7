//! JSON-RPC ledger backend using the Alloy library.
//!
//! Talks to an EVM node over HTTP and signs with a local key. `advance` relies
//! on the `evm_mine` development method, so this backend targets dev nodes
//! such as anvil or hardhat.

use crate::{LedgerError, LedgerInterface, SubmissionError};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use waiter_types::{
	ConfigSchema, Field, FieldType, LogEntry, LogFilter, Operation, OperationHandle,
	OperationStatus, Receipt, Schema, ValidationError,
};

/// Alloy-based ledger implementation.
pub struct AlloyLedger {
	/// The Alloy provider, with a wallet filler for automatic signing.
	provider: DynProvider,
	/// The chain ID transactions are signed for.
	chain_id: u64,
	/// The only account this backend can submit from.
	signer_address: Address,
}

impl AlloyLedger {
	/// Creates a new AlloyLedger for the given endpoint and signing key.
	pub fn new(
		rpc_url: &str,
		chain_id: u64,
		signer: PrivateKeySigner,
	) -> Result<Self, LedgerError> {
		let url = rpc_url
			.parse()
			.map_err(|e| LedgerError::Config(format!("Invalid RPC URL: {}", e)))?;

		let signer = signer.with_chain_id(Some(chain_id));
		let signer_address = signer.address();
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_http(url)
			.erased();

		Ok(Self {
			provider,
			chain_id,
			signer_address,
		})
	}

	pub fn signer_address(&self) -> Address {
		self.signer_address
	}

	fn request(&self, operation: Operation) -> TransactionRequest {
		let mut request = TransactionRequest::default()
			.with_from(operation.from)
			.with_chain_id(self.chain_id)
			.with_value(operation.value)
			.with_gas_limit(operation.gas_limit)
			.with_gas_price(operation.gas_price);
		request = match operation.to {
			Some(to) => request.with_to(to).with_input(operation.input),
			None => request.with_deploy_code(operation.input),
		};
		if let Some(nonce) = operation.nonce {
			request = request.with_nonce(nonce);
		}
		request
	}
}

fn network(context: &str, error: impl std::fmt::Display) -> LedgerError {
	LedgerError::Network(format!("{}: {}", context, error))
}

#[async_trait]
impl LedgerInterface for AlloyLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyLedgerSchema)
	}

	async fn submit(&self, operation: Operation) -> Result<OperationHandle, LedgerError> {
		if operation.from != self.signer_address {
			return Err(SubmissionError::Rejected(format!(
				"sender {} is not the configured signer {}",
				operation.from, self.signer_address
			))
			.into());
		}

		// The node validates nonce, funds and gas; its refusal is a rejection.
		let pending = self
			.provider
			.send_transaction(self.request(operation))
			.await
			.map_err(|e| SubmissionError::Rejected(e.to_string()))?;

		let handle = OperationHandle(*pending.tx_hash());
		tracing::debug!(tx_hash = %handle.short(), "Transaction accepted by node");
		Ok(handle)
	}

	async fn status(&self, handle: &OperationHandle) -> Result<OperationStatus, LedgerError> {
		let receipt = self
			.provider
			.get_transaction_receipt(handle.0)
			.await
			.map_err(|e| network("Failed to get receipt", e))?;

		// A node cannot tell pending from unknown; both have no receipt yet.
		Ok(match receipt {
			None => OperationStatus::Pending,
			Some(receipt) => OperationStatus::Finalized(Receipt {
				hash: OperationHandle(receipt.transaction_hash),
				block_number: receipt.block_number.unwrap_or(0),
				gas_used: receipt.gas_used,
				success: receipt.status(),
				contract_address: receipt.contract_address,
				effective_gas_price: receipt.effective_gas_price,
			}),
		})
	}

	async fn balance(&self, account: Address) -> Result<U256, LedgerError> {
		self.provider
			.get_balance(account)
			.await
			.map_err(|e| network("Failed to get balance", e))
	}

	async fn code_at(&self, address: Address) -> Result<Bytes, LedgerError> {
		self.provider
			.get_code_at(address)
			.await
			.map_err(|e| network("Failed to get code", e))
	}

	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, LedgerError> {
		let request = TransactionRequest::default().with_to(to).with_input(input);
		self.provider
			.call(request)
			.await
			.map_err(|e| LedgerError::Call(e.to_string()))
	}

	async fn logs(&self, filter: &LogFilter) -> Result<Vec<LogEntry>, LedgerError> {
		let mut query = Filter::new();
		if let Some(address) = filter.address {
			query = query.address(address);
		}
		if let Some(signature) = filter.event_signature {
			query = query.event_signature(signature);
		}
		if !filter.topic1.is_empty() {
			query = query.topic1(filter.topic1.clone());
		}
		query = query.from_block(filter.from_block.unwrap_or(0));
		if let Some(to_block) = filter.to_block {
			query = query.to_block(to_block);
		}

		let logs = self
			.provider
			.get_logs(&query)
			.await
			.map_err(|e| network("Failed to get logs", e))?;

		Ok(logs
			.into_iter()
			.map(|log| LogEntry {
				address: log.inner.address,
				topics: log.inner.data.topics().to_vec(),
				data: log.inner.data.data.clone(),
				block_number: log.block_number.unwrap_or(0),
				transaction_hash: OperationHandle(log.transaction_hash.unwrap_or_default()),
			})
			.collect())
	}

	async fn gas_price(&self) -> Result<u128, LedgerError> {
		self.provider
			.get_gas_price()
			.await
			.map_err(|e| network("Failed to get gas price", e))
	}

	async fn advance(&self) -> Result<u64, LedgerError> {
		self.provider
			.raw_request::<_, serde_json::Value>("evm_mine".into(), Vec::<serde_json::Value>::new())
			.await
			.map_err(|e| network("evm_mine failed", e))?;

		self.provider
			.get_block_number()
			.await
			.map_err(|e| network("Failed to get block number", e))
	}
}

/// Configuration schema for the Alloy ledger.
pub struct AlloyLedgerSchema;

impl ConfigSchema for AlloyLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(|value| {
					let url = value.as_str().unwrap_or_default();
					if url.starts_with("http://") || url.starts_with("https://") {
						Ok(())
					} else {
						Err("RPC URL must start with http:// or https://".to_string())
					}
				}),
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().unwrap_or_default();
					let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

					if key_without_prefix.len() != 64 {
						return Err("Private key must be 64 hex characters (32 bytes)".to_string());
					}

					if hex::decode(key_without_prefix).is_err() {
						return Err("Private key must be valid hexadecimal".to_string());
					}

					Ok(())
				}),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			// Optional fields
			vec![],
		);

		schema.validate(config)
	}
}

/// Factory function to create an RPC-backed ledger from configuration.
///
/// Required configuration parameters:
/// - `rpc_url`: The HTTP RPC endpoint URL
/// - `chain_id`: The blockchain network chain ID
/// - `private_key`: The private key for transaction signing
pub fn create_rpc_ledger(config: &toml::Value) -> Result<AlloyLedger, LedgerError> {
	let field = |name: &str| {
		config
			.get(name)
			.ok_or_else(|| LedgerError::Config(format!("{} is required", name)))
	};

	let rpc_url = field("rpc_url")?
		.as_str()
		.ok_or_else(|| LedgerError::Config("rpc_url must be a string".to_string()))?;
	let chain_id = field("chain_id")?
		.as_integer()
		.and_then(|id| u64::try_from(id).ok())
		.ok_or_else(|| LedgerError::Config("chain_id must be a positive integer".to_string()))?;
	let private_key = field("private_key")?
		.as_str()
		.ok_or_else(|| LedgerError::Config("private_key must be a string".to_string()))?;

	let signer: PrivateKeySigner = private_key
		.parse()
		.map_err(|e| LedgerError::Config(format!("Invalid private key: {}", e)))?;

	AlloyLedger::new(rpc_url, chain_id, signer)
}

#[cfg(test)]
mod tests {
	use super::*;

	const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn config(rpc_url: &str) -> toml::Value {
		toml::from_str(&format!(
			"rpc_url = \"{}\"\nchain_id = 31337\nprivate_key = \"{}\"",
			rpc_url, DEV_KEY
		))
		.unwrap()
	}

	#[test]
	fn test_schema_accepts_dev_node_config() {
		assert!(AlloyLedgerSchema.validate(&config("http://127.0.0.1:8545")).is_ok());
	}

	#[test]
	fn test_schema_rejects_bad_url_and_key() {
		assert!(AlloyLedgerSchema.validate(&config("ws://127.0.0.1:8545")).is_err());

		let short_key: toml::Value = toml::from_str(
			"rpc_url = \"http://127.0.0.1:8545\"\nchain_id = 1\nprivate_key = \"0x1234\"",
		)
		.unwrap();
		assert!(AlloyLedgerSchema.validate(&short_key).is_err());
	}

	#[tokio::test]
	async fn test_factory_derives_signer_address() {
		let ledger = create_rpc_ledger(&config("http://127.0.0.1:8545")).unwrap();
		let expected: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
		assert_eq!(ledger.signer_address(), expected);
	}

	#[tokio::test]
	async fn test_foreign_sender_is_rejected_before_network() {
		let ledger = create_rpc_ledger(&config("http://127.0.0.1:8545")).unwrap();
		let operation = Operation::transfer(Address::repeat_byte(1), Address::ZERO, U256::ZERO);
		assert!(matches!(
			ledger.submit(operation).await,
			Err(LedgerError::Rejected(SubmissionError::Rejected(_)))
		));
	}
}
