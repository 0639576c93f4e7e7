//! Event bus for waiter progress notifications.
//!
//! A broadcast channel that lets any number of observers follow what the
//! waiter is doing without the waiter knowing about them.

use tokio::sync::broadcast;
use waiter_types::WaiterEvent;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Event bus for broadcasting waiter events to multiple subscribers.
///
/// Slow subscribers lose the oldest events once `capacity` is exceeded.
pub struct EventBus {
	sender: broadcast::Sender<WaiterEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Creates a new subscriber that receives every event published after
	/// this call.
	pub fn subscribe(&self) -> broadcast::Receiver<WaiterEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns an error if there are no active subscribers; the waiter
	/// ignores it.
	pub fn publish(
		&self,
		event: WaiterEvent,
	) -> Result<(), broadcast::error::SendError<WaiterEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

/// Clones share the underlying channel.
impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use waiter_types::{OperationHandle, B256};

	#[tokio::test]
	async fn test_publish_reaches_every_subscriber() {
		let bus = EventBus::new(4);
		let mut first = bus.subscribe();
		let mut second = bus.clone().subscribe();
		let event = WaiterEvent::Waiting {
			handle: OperationHandle(B256::repeat_byte(1)),
			deadline: Duration::from_secs(20),
		};

		bus.publish(event.clone()).unwrap();
		assert_eq!(first.recv().await.unwrap(), event);
		assert_eq!(second.recv().await.unwrap(), event);
	}

	#[test]
	fn test_publish_without_subscribers_is_an_error() {
		let bus = EventBus::default();
		let event = WaiterEvent::TimedOut {
			handle: OperationHandle(B256::ZERO),
			after: Duration::from_secs(1),
		};
		assert!(bus.publish(event).is_err());
	}
}
