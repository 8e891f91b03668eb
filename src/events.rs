// Route event channel
//
// Fan-out of resolution results, live updates and fee changes to any
// number of subscribers. Remembers the request id of the last event.
//
// Numan Thabit 2025 Nov

use crate::router::routes::SuggestedRoutesResponse;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

#[derive(Clone)]
pub struct EventBus {
	last_uuid: Arc<RwLock<Option<String>>>,
	tx: broadcast::Sender<SuggestedRoutesResponse>,
}

impl EventBus {
	pub fn new(buffer: usize) -> Self {
		let (tx, _) = broadcast::channel(buffer.max(1));
		Self { last_uuid: Arc::new(RwLock::new(None)), tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SuggestedRoutesResponse> {
		self.tx.subscribe()
	}

	pub fn receiver_count(&self) -> usize {
		self.tx.receiver_count()
	}

	pub async fn last_uuid(&self) -> Option<String> {
		self.last_uuid.read().await.clone()
	}

	/// Returns the number of subscribers that received the event.
	pub async fn publish(&self, event: SuggestedRoutesResponse) -> usize {
		{
			let mut guard = self.last_uuid.write().await;
			*guard = Some(event.uuid.clone());
		}
		let uuid = event.uuid.clone();
		let updated = event.updated;
		// no subscribers is not an error
		let receivers = self.tx.send(event).unwrap_or(0);
		debug!(uuid = %uuid, updated, receivers, "route event published");
		receivers
	}
}
