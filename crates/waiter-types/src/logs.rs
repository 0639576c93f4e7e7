//! Event log types.

use crate::OperationHandle;
use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// A single log emitted by a finalized operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
	/// Contract that emitted the log.
	pub address: Address,
	/// Indexed topics; the first one is the event signature hash.
	pub topics: Vec<B256>,
	/// Non-indexed event data.
	pub data: Bytes,
	pub block_number: u64,
	pub transaction_hash: OperationHandle,
}

impl LogEntry {
	/// Event signature hash, if the log has one.
	pub fn signature(&self) -> Option<&B256> {
		self.topics.first()
	}
}

/// Selection criteria for log queries.
///
/// Empty criteria match everything. `topic1` holds alternatives: a log matches
/// when its second topic equals any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
	pub address: Option<Address>,
	pub event_signature: Option<B256>,
	pub topic1: Vec<B256>,
	pub from_block: Option<u64>,
	pub to_block: Option<u64>,
}

impl LogFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn address(mut self, address: Address) -> Self {
		self.address = Some(address);
		self
	}

	pub fn event_signature(mut self, signature: B256) -> Self {
		self.event_signature = Some(signature);
		self
	}

	/// Accept logs whose first indexed argument is any of `values`.
	pub fn topic1_any(mut self, values: impl IntoIterator<Item = B256>) -> Self {
		self.topic1.extend(values);
		self
	}

	pub fn from_block(mut self, block: u64) -> Self {
		self.from_block = Some(block);
		self
	}

	pub fn to_block(mut self, block: u64) -> Self {
		self.to_block = Some(block);
		self
	}

	pub fn matches(&self, log: &LogEntry) -> bool {
		if let Some(address) = self.address {
			if log.address != address {
				return false;
			}
		}
		if let Some(signature) = self.event_signature {
			if log.signature() != Some(&signature) {
				return false;
			}
		}
		if !self.topic1.is_empty() {
			match log.topics.get(1) {
				Some(topic) if self.topic1.contains(topic) => {}
				_ => return false,
			}
		}
		if self.from_block.is_some_and(|from| log.block_number < from) {
			return false;
		}
		if self.to_block.is_some_and(|to| log.block_number > to) {
			return false;
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(address: Address, topics: Vec<B256>, block_number: u64) -> LogEntry {
		LogEntry {
			address,
			topics,
			data: Bytes::new(),
			block_number,
			transaction_hash: OperationHandle(B256::ZERO),
		}
	}

	#[test]
	fn test_empty_filter_matches_everything() {
		let log = entry(Address::repeat_byte(1), vec![], 3);
		assert!(LogFilter::new().matches(&log));
	}

	#[test]
	fn test_filter_by_signature_and_indexed_owner() {
		let contract = Address::repeat_byte(1);
		let sig = B256::repeat_byte(0x11);
		let alice = Address::repeat_byte(0xaa).into_word();
		let bob = Address::repeat_byte(0xbb).into_word();

		let filter = LogFilter::new()
			.address(contract)
			.event_signature(sig)
			.topic1_any([alice]);

		assert!(filter.matches(&entry(contract, vec![sig, alice], 1)));
		assert!(!filter.matches(&entry(contract, vec![sig, bob], 1)));
		assert!(!filter.matches(&entry(contract, vec![sig], 1)));
		assert!(!filter.matches(&entry(Address::ZERO, vec![sig, alice], 1)));
	}

	#[test]
	fn test_block_range() {
		let filter = LogFilter::new().from_block(2).to_block(4);
		assert!(!filter.matches(&entry(Address::ZERO, vec![], 1)));
		assert!(filter.matches(&entry(Address::ZERO, vec![], 2)));
		assert!(filter.matches(&entry(Address::ZERO, vec![], 4)));
		assert!(!filter.matches(&entry(Address::ZERO, vec![], 5)));
	}
}
