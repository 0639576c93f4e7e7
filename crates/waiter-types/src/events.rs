use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{DeployedAddress, OperationHandle, Receipt};

/// Progress notifications published while waiting on the ledger.
///
/// Purely informational: nothing in the waiter reacts to whether anybody
/// received them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaiterEvent {
	/// A watch task was started for the operation.
	Waiting {
		handle: OperationHandle,
		deadline: Duration,
	},
	Confirmed {
		receipt: Receipt,
	},
	Deployed {
		deployed: DeployedAddress,
	},
	/// The deadline passed before the operation was finalized.
	TimedOut {
		handle: OperationHandle,
		after: Duration,
	},
}

impl WaiterEvent {
	/// The operation the event is about.
	pub fn handle(&self) -> OperationHandle {
		match self {
			WaiterEvent::Waiting { handle, .. } | WaiterEvent::TimedOut { handle, .. } => *handle,
			WaiterEvent::Confirmed { receipt } => receipt.hash,
			WaiterEvent::Deployed { deployed } => deployed.handle,
		}
	}
}
