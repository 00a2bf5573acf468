use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::entities::volunteer_assignment::AssignmentStatus;
use crate::entities::inventory_transaction::TransactionType;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Channel of the given capacity with its sender already wrapped.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends after a committed write. The write already happened, so a closed
    /// channel is only worth a warning.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

// Facts published once the owning transaction has committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Assignment events
    AssignmentCreated {
        assignment_id: i32,
        volunteer_id: i32,
        route_id: i32,
        scheduled_date: DateTime<Utc>,
        shift_type: String,
    },
    AssignmentStatusChanged {
        assignment_id: i32,
        old_status: AssignmentStatus,
        new_status: AssignmentStatus,
    },

    // Client events
    ClientCreated(i32),
    ClientUpdated(i32),
    ClientDeleted(i32),
    AssociationsReconciled {
        client_id: i32,
        association: String,
        added: Vec<i32>,
        removed: Vec<i32>,
    },
    OwnedCollectionReplaced {
        owner_id: i32,
        collection: String,
        removed: u64,
        inserted: usize,
    },

    // Inventory events
    InventoryTransactionRecorded {
        transaction_id: i32,
        item_id: i32,
        signed_quantity: i32,
        transaction_type: TransactionType,
        new_quantity: i32,
    },
    InventoryReorderPointReached {
        item_id: i32,
        current_quantity: i32,
        reorder_threshold: i32,
        reorder_quantity: i32,
    },
}

// Drains the channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::InventoryReorderPointReached {
                item_id,
                current_quantity,
                reorder_threshold,
                reorder_quantity,
            } => {
                warn!(
                    "Low inventory alert: item {} has {} units (threshold {}), suggested reorder {}",
                    item_id, current_quantity, reorder_threshold, reorder_quantity
                );
            }
            Event::AssignmentStatusChanged {
                assignment_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Assignment {} moved from {} to {}",
                    assignment_id, old_status, new_status
                );
            }
            _ => {
                info!("Received event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_after_receiver_dropped_is_an_error() {
        let (sender, rx) = EventSender::channel(4);
        drop(rx);
        assert!(sender.send(Event::ClientCreated(1)).await.is_err());
        // must not panic
        sender.send_or_log(Event::ClientDeleted(1)).await;
    }

    #[tokio::test]
    async fn processing_loop_ends_when_senders_are_gone() {
        let (sender, rx) = EventSender::channel(4);
        sender.send(Event::ClientUpdated(3)).await.unwrap();
        drop(sender);
        process_events(rx).await;
    }
}
