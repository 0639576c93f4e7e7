//! ABI of the cockroach breeding token.
//!
//! Shared by the simulated contract, which decodes these calls, and by the
//! scenarios, which encode them.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use waiter_types::LogEntry;

sol! {
	/// Non-fungible breeding token. Every spawned cockroach is one token.
	interface IBreedingToken {
		function name() external view returns (string);
		function symbol() external view returns (string);
		function totalSupply() external view returns (uint256);
		function balanceOf(address owner) external view returns (uint256);
		function speedUnitFee() external view returns (uint256);
		function setSpeedUnitFee(uint256 fee) external;
		function spawn(string name, uint256 speed) external payable returns (uint256);
		function getOwnerTokens(address owner) external view returns (uint256[]);
		function cockroaches(uint256 tokenId) external view returns (string name, uint256 speed, address owner);

		/// Emitted once per minted token.
		event Spawn(address indexed to, uint256 tokenId);
	}
}

/// Topic of the `Spawn` event.
pub fn spawn_topic() -> B256 {
	IBreedingToken::Spawn::SIGNATURE_HASH
}

/// Calldata for `spawn(name, speed)`.
pub fn spawn_call(name: &str, speed: u64) -> Bytes {
	IBreedingToken::spawnCall {
		name: name.to_string(),
		speed: U256::from(speed),
	}
	.abi_encode()
	.into()
}

/// Calldata for `setSpeedUnitFee(fee)`.
pub fn set_speed_unit_fee_call(fee: U256) -> Bytes {
	IBreedingToken::setSpeedUnitFeeCall { fee }.abi_encode().into()
}

/// A decoded `Spawn` log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnEvent {
	pub to: Address,
	pub token_id: U256,
}

impl SpawnEvent {
	/// Decodes a log entry, returning `None` for logs of other events.
	pub fn from_log(log: &LogEntry) -> Option<Self> {
		let spawn =
			IBreedingToken::Spawn::decode_raw_log(log.topics.iter().copied(), &log.data).ok()?;
		Some(Self {
			to: spawn.to,
			token_id: spawn.tokenId,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use waiter_types::OperationHandle;

	#[test]
	fn test_spawn_log_decodes() {
		let owner = Address::repeat_byte(0x42);
		let event = IBreedingToken::Spawn {
			to: owner,
			tokenId: U256::from(7u64),
		};
		let data = event.encode_log_data();
		let log = LogEntry {
			address: Address::ZERO,
			topics: data.topics().to_vec(),
			data: data.data.clone(),
			block_number: 1,
			transaction_hash: OperationHandle(B256::ZERO),
		};

		assert_eq!(
			SpawnEvent::from_log(&log),
			Some(SpawnEvent {
				to: owner,
				token_id: U256::from(7u64)
			})
		);
	}

	#[test]
	fn test_foreign_log_is_ignored() {
		let log = LogEntry {
			address: Address::ZERO,
			topics: vec![B256::repeat_byte(1)],
			data: Bytes::new(),
			block_number: 1,
			transaction_hash: OperationHandle(B256::ZERO),
		};
		assert_eq!(SpawnEvent::from_log(&log), None);
	}

	#[test]
	fn test_truncated_spawn_log_is_ignored() {
		let log = LogEntry {
			address: Address::ZERO,
			topics: vec![spawn_topic()],
			data: Bytes::new(),
			block_number: 1,
			transaction_hash: OperationHandle(B256::ZERO),
		};
		assert_eq!(SpawnEvent::from_log(&log), None);
	}

	#[test]
	fn test_spawn_call_has_selector() {
		let calldata = spawn_call("Jack", 5);
		assert_eq!(&calldata[..4], &IBreedingToken::spawnCall::SELECTOR);
	}
}
