use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::entities::customer_request::RequestStatus;
use crate::entities::order::OrderStatus;

/// Sender half of the application event channel.
///
/// Services publish events after their transactions commit; delivery is
/// best-effort and never affects the outcome of the committed operation.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Inventory events
    InventoryReceived {
        part_id: i32,
        location_id: i32,
        qty: i32,
        log_id: i32,
    },
    InventoryQuantitySet {
        inventory_id: i32,
        old_qty: i32,
        new_qty: i32,
    },
    InventoryRowDeleted(i32),
    InventoryLogUpdated {
        log_id: i32,
        old_qty: i32,
        new_qty: i32,
    },
    InventoryLogDeleted(i32),

    // Catalog events
    PartCreated(i32),
    PartUpdated(i32),
    PartDeleted(i32),
    LocationCreated(i32),
    PartnerCreated(i32),

    // Order events
    OrderCreated {
        order_id: i32,
        request_id: i32,
    },
    OrderStatusChanged {
        order_id: i32,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    OrderPartEdited {
        order_id: i32,
        part_id: i32,
        old_qty: i32,
        new_qty: i32,
    },
    OrderDeleted {
        order_id: i32,
        stock_reversed: bool,
    },

    // Customer request events
    RequestSubmitted(i32),
    RequestStatusChanged {
        request_id: i32,
        new_status: RequestStatus,
    },

    // Scrap events
    ScrapRecorded {
        scrap_id: i32,
        part_id: i32,
        qty: i32,
    },
}

// Define a trait for handling events. Handlers implementing this trait will process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: &Event) -> Result<(), String>;
}

/// Default handler that writes every event to the structured log.
pub struct LoggingEventHandler;

#[async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: &Event) -> Result<(), String> {
        match event {
            Event::InventoryReceived {
                part_id,
                location_id,
                qty,
                log_id,
            } => {
                info!(
                    "Inventory received: part_id={}, location_id={}, qty={}, log_id={}",
                    part_id, location_id, qty, log_id
                );
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} status changed: {} -> {}",
                    order_id, old_status, new_status
                );
            }
            Event::OrderDeleted {
                order_id,
                stock_reversed,
            } => {
                if *stock_reversed {
                    info!("Order {} deleted, stock returned to shelf", order_id);
                } else {
                    info!("Order {} deleted without stock reversal", order_id);
                }
            }
            Event::InventoryLogDeleted(log_id) => {
                warn!("Inventory receipt log {} deleted", log_id);
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
        Ok(())
    }
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Arc<dyn EventHandler>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        for handler in &handlers {
            if let Err(e) = handler.handle_event(&event).await {
                error!("Event handler failed: event={:?}, error={}", event, e);
            }
        }
    }

    warn!("Event processing loop has ended");
}
