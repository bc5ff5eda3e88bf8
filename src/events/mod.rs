use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services::catalog_sync::SyncMode;

/// Severity of a transient user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// Short-lived, human-readable message shown after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when nobody is listening.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            debug!("Dropping event: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Connection events
    Connected {
        item_count: usize,
        category_count: usize,
    },
    ConnectionFailed {
        reason: String,
    },
    DemoLoaded,

    // Sync events
    CatalogSynced {
        mode: SyncMode,
        item_count: usize,
        category_count: usize,
    },
    DemoSyncSkipped {
        mode: SyncMode,
    },
    SyncFailed {
        mode: SyncMode,
        reason: String,
    },
    StaleSyncDiscarded {
        mode: SyncMode,
    },

    // Item events
    ItemAdded {
        item_id: String,
        name: String,
    },
    ItemUpdated {
        item_id: String,
        name: String,
    },
    ItemDeleted {
        item_id: String,
    },

    // Ledger events
    DeliveryRecorded {
        item_id: String,
        delivery_id: String,
        quantity: u32,
        total_cost: Decimal,
    },
    SaleRecorded {
        item_id: String,
        quantity: u32,
        revenue: Decimal,
    },
    StockAdjusted {
        item_id: String,
        delta: i64,
        previous_quantity: u32,
        new_quantity: u32,
        note: String,
    },

    // Vendor and category events
    VendorAdded {
        vendor_id: String,
        name: String,
    },
    VendorUpdated {
        vendor_id: String,
        name: String,
    },
    VendorDeleted {
        vendor_id: String,
    },
    CategoryAdded {
        category_id: String,
        name: String,
    },

    /// A command failed validation or referenced a missing record.
    CommandRejected {
        message: String,
    },
}

impl Event {
    /// The transient message to show for this event, if any. Silent syncs
    /// never produce one.
    pub fn notification(&self) -> Option<Notification> {
        let note = match self {
            Event::Connected { .. } => Notification::success("Connected to Clover"),
            Event::ConnectionFailed { reason } => {
                Notification::error(format!("Connection failed: {}", reason))
            }
            Event::DemoLoaded => Notification::success("Started in demo mode"),
            Event::CatalogSynced { mode, .. } if mode.is_manual() => {
                Notification::success("Synced with Clover")
            }
            Event::DemoSyncSkipped { mode } if mode.is_manual() => {
                Notification::warning("Demo mode has no live sync")
            }
            Event::SyncFailed { mode, reason } if mode.is_manual() => {
                Notification::error(format!("Sync failed: {}", reason))
            }
            Event::CatalogSynced { .. }
            | Event::DemoSyncSkipped { .. }
            | Event::SyncFailed { .. }
            | Event::StaleSyncDiscarded { .. } => return None,
            Event::ItemAdded { .. } => Notification::success("Item added"),
            Event::ItemUpdated { .. } => Notification::success("Item updated"),
            Event::ItemDeleted { .. } => Notification::success("Item deleted"),
            Event::DeliveryRecorded { quantity, .. } => {
                Notification::success(format!("Recorded delivery of {} units", quantity))
            }
            Event::SaleRecorded { quantity, .. } => {
                Notification::success(format!("Recorded sale of {} units", quantity))
            }
            Event::StockAdjusted { delta, .. } => {
                Notification::success(format!("Stock adjusted by {:+}", delta))
            }
            Event::VendorAdded { .. } => Notification::success("Vendor added"),
            Event::VendorUpdated { .. } => Notification::success("Vendor updated"),
            Event::VendorDeleted { .. } => Notification::success("Vendor deleted"),
            Event::CategoryAdded { .. } => Notification::success("Category added"),
            Event::CommandRejected { message } => Notification::error(message.clone()),
        };
        Some(note)
    }
}

/// Drains the event channel, logging every event and handing user-facing
/// notifications to `on_notification`.
pub async fn process_events<F>(mut rx: mpsc::Receiver<Event>, mut on_notification: F)
where
    F: FnMut(Notification),
{
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::SyncFailed { mode, reason } => {
                warn!(?mode, "Catalog sync failed: {}", reason)
            }
            Event::StockAdjusted {
                item_id,
                delta,
                note,
                ..
            } => info!(item_id = %item_id, delta = *delta, note = %note, "Stock adjusted"),
            other => debug!("Received event: {:?}", other),
        }

        if let Some(notification) = event.notification() {
            on_notification(notification);
        }
    }

    info!("Event channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn silent_sync_events_have_no_notification() {
        let failed = Event::SyncFailed {
            mode: SyncMode::Silent,
            reason: "timeout".into(),
        };
        assert_eq!(failed.notification(), None);

        let synced = Event::CatalogSynced {
            mode: SyncMode::Silent,
            item_count: 1,
            category_count: 1,
        };
        assert_eq!(synced.notification(), None);
    }

    #[test]
    fn manual_sync_failure_is_an_error_notification() {
        let failed = Event::SyncFailed {
            mode: SyncMode::Manual,
            reason: "POS API error: 500 on /items".into(),
        };
        let note = failed.notification().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert!(note.message.contains("500"));
    }

    #[test]
    fn stock_adjustment_message_is_signed() {
        let event = Event::StockAdjusted {
            item_id: "itm1".into(),
            delta: 3,
            previous_quantity: 1,
            new_quantity: 4,
            note: String::new(),
        };
        assert_eq!(event.notification().unwrap().message, "Stock adjusted by +3");

        let sale = Event::SaleRecorded {
            item_id: "itm1".into(),
            quantity: 2,
            revenue: dec!(7.98),
        };
        assert_eq!(sale.notification().unwrap().kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn process_events_forwards_notifications() {
        let (sender, rx) = EventSender::channel(8);
        sender.publish(Event::DemoLoaded).await;
        sender
            .publish(Event::StaleSyncDiscarded {
                mode: SyncMode::Manual,
            })
            .await;
        drop(sender);

        let mut seen = Vec::new();
        process_events(rx, |n| seen.push(n)).await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "Started in demo mode");
    }
}
