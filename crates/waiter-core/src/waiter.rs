//! The confirmation waiter.
//!
//! Every wait spawns exactly one watch task that polls the ledger and hands
//! its single outcome back over a oneshot channel, while the caller races
//! that channel against a deadline. When the deadline wins, the receiver is
//! dropped; the watch task observes the closed channel and exits without
//! polling again.

use crate::confirmation::{Confirmation, Deployed, Mined};
use crate::event_bus::EventBus;
use crate::WaitError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info};
use waiter_ledger::LedgerInterface;
use waiter_types::{DeployedAddress, OperationHandle, Receipt, WaiterEvent};

/// Deadline applied by [`ConfirmationWaiter::await_confirmation`] and
/// [`ConfirmationWaiter::await_deployment`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause between two status queries of a watch task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Blocks callers until submitted operations are finalized or a deadline
/// passes.
#[derive(Clone)]
pub struct ConfirmationWaiter {
	ledger: Arc<dyn LedgerInterface>,
	timeout: Duration,
	poll_interval: Duration,
	events: EventBus,
}

impl ConfirmationWaiter {
	pub fn new(ledger: Arc<dyn LedgerInterface>) -> Self {
		Self {
			ledger,
			timeout: DEFAULT_TIMEOUT,
			poll_interval: DEFAULT_POLL_INTERVAL,
			events: EventBus::default(),
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
		self.poll_interval = poll_interval;
		self
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// Waits for the operation's receipt.
	///
	/// An operation that was confirmed but failed is still `Ok`; inspect
	/// `Receipt::success`. Only the deadline yields [`WaitError::Timeout`].
	pub async fn await_confirmation(&self, handle: &OperationHandle) -> Result<Receipt, WaitError> {
		let receipt = self.wait_for(handle, Mined, self.timeout).await?;
		info!(
			tx_hash = %handle.short(),
			block = receipt.block_number,
			gas_used = receipt.gas_used,
			success = receipt.success,
			"Operation confirmed"
		);
		let _ = self.events.publish(WaiterEvent::Confirmed {
			receipt: receipt.clone(),
		});
		Ok(receipt)
	}

	/// Waits for a deployment to be mined and for its contract to hold code.
	pub async fn await_deployment(
		&self,
		handle: &OperationHandle,
	) -> Result<DeployedAddress, WaitError> {
		let deployed = self.wait_for(handle, Deployed, self.timeout).await?;
		info!(tx_hash = %handle.short(), address = %deployed.address, "Contract deployed");
		let _ = self.events.publish(WaiterEvent::Deployed { deployed });
		Ok(deployed)
	}

	/// Races a watch task for `condition` against `deadline`.
	pub async fn wait_for<C: Confirmation>(
		&self,
		handle: &OperationHandle,
		condition: C,
		deadline: Duration,
	) -> Result<C::Output, WaitError> {
		let (mut tx, rx) = oneshot::channel();
		let ledger = self.ledger.clone();
		let poll_interval = self.poll_interval;
		let watched = *handle;

		tokio::spawn(async move {
			let outcome = tokio::select! {
				biased;
				_ = tx.closed() => {
					debug!(tx_hash = %watched.short(), "Waiter gone, watch task exiting");
					return;
				}
				outcome = watch(ledger.as_ref(), &watched, &condition, poll_interval) => outcome,
			};
			// Capacity one and a single send: this never blocks.
			let _ = tx.send(outcome);
		});

		debug!(tx_hash = %handle.short(), ?deadline, "Waiting for confirmation");
		let _ = self.events.publish(WaiterEvent::Waiting {
			handle: *handle,
			deadline,
		});

		match tokio::time::timeout(deadline, rx).await {
			Ok(Ok(outcome)) => outcome,
			Ok(Err(_)) => Err(WaitError::WatchAborted(*handle)),
			Err(_) => {
				error!(tx_hash = %handle, after = ?deadline, "Timed out waiting for confirmation");
				let _ = self.events.publish(WaiterEvent::TimedOut {
					handle: *handle,
					after: deadline,
				});
				Err(WaitError::Timeout {
					handle: *handle,
					after: deadline,
				})
			}
		}
	}
}

async fn watch<C: Confirmation>(
	ledger: &dyn LedgerInterface,
	handle: &OperationHandle,
	condition: &C,
	poll_interval: Duration,
) -> Result<C::Output, WaitError> {
	loop {
		match condition.check(ledger, handle).await {
			Ok(Some(output)) => return Ok(output),
			Ok(None) => {}
			Err(e) if e.is_transient() => {
				debug!(tx_hash = %handle.short(), error = %e, "Status query failed, retrying");
			}
			Err(e) => return Err(e),
		}
		tokio::time::sleep(poll_interval).await;
	}
}
