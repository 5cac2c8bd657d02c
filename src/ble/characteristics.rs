//! GATT characteristic handling.
//!
//! Provides functionality for subscribing to characteristics on an oximeter
//! and forwarding their notifications.

use btleplug::api::{Characteristic, Peripheral as _};
use btleplug::platform::Peripheral;
use futures::stream::StreamExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Notification event from a characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// UUID of the characteristic that sent the notification.
    pub characteristic_uuid: Uuid,
    /// The notification data.
    pub data: Vec<u8>,
}

/// Handler for GATT characteristics on an oximeter.
pub struct CharacteristicHandler {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by UUID.
    characteristics: Arc<RwLock<HashMap<Uuid, Characteristic>>>,
    /// Channel for notification events.
    notification_tx: broadcast::Sender<NotificationEvent>,
    /// Whether the listener task is running.
    is_listening: Arc<AtomicBool>,
    /// Handle to the notification listener task.
    listener_handle: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl CharacteristicHandler {
    /// Create a new characteristic handler for a peripheral.
    ///
    /// Note: Services must be discovered before using this handler.
    pub fn new(peripheral: Peripheral, capacity: usize) -> Self {
        let (notification_tx, _) = broadcast::channel(capacity.max(1));

        Self {
            peripheral,
            characteristics: Arc::new(RwLock::new(HashMap::new())),
            notification_tx,
            is_listening: Arc::new(AtomicBool::new(false)),
            listener_handle: RwLock::new(None),
        }
    }

    /// Discover and cache all characteristics.
    pub fn discover_characteristics(&self) -> usize {
        let services = self.peripheral.services();

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in services {
            for characteristic in service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                chars.insert(characteristic.uuid, characteristic);
            }
        }

        debug!("Discovered {} characteristics", chars.len());
        chars.len()
    }

    /// Check if a characteristic exists.
    pub fn has_characteristic(&self, uuid: &Uuid) -> bool {
        self.characteristics.read().contains_key(uuid)
    }

    fn characteristic(&self, uuid: &Uuid) -> Result<Characteristic> {
        self.characteristics
            .read()
            .get(uuid)
            .cloned()
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Subscribe to notifications from a characteristic.
    pub async fn subscribe(&self, uuid: &Uuid) -> Result<()> {
        let characteristic = self.characteristic(uuid)?;

        debug!(
            "Subscribing to {}, properties: {:?}",
            uuid, characteristic.properties
        );

        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        debug!("Subscribed to notifications from {}", uuid);
        Ok(())
    }

    /// Unsubscribe from notifications from a characteristic.
    pub async fn unsubscribe(&self, uuid: &Uuid) -> Result<()> {
        let characteristic = self.characteristic(uuid)?;

        self.peripheral
            .unsubscribe(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        debug!("Unsubscribed from notifications from {}", uuid);
        Ok(())
    }

    /// Start forwarding notifications to subscribers of
    /// [`subscribe_notifications`](Self::subscribe_notifications).
    ///
    /// The listener stops on its own when the platform ends the notification
    /// stream, which happens when the link drops.
    pub async fn start_notifications(&self) -> Result<()> {
        if self.is_listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut notifications = match self.peripheral.notifications().await {
            Ok(n) => n,
            Err(e) => {
                self.is_listening.store(false, Ordering::SeqCst);
                return Err(Error::Bluetooth(e));
            }
        };

        let is_listening = self.is_listening.clone();
        let notification_tx = self.notification_tx.clone();

        let handle = tokio::spawn(async move {
            debug!("Notification listener started");

            while let Some(notification) = notifications.next().await {
                if !is_listening.load(Ordering::SeqCst) {
                    break;
                }

                trace!(
                    "Notification from {}: {:02X?}",
                    notification.uuid,
                    notification.value
                );

                let _ = notification_tx.send(NotificationEvent {
                    characteristic_uuid: notification.uuid,
                    data: notification.value,
                });
            }

            if is_listening.swap(false, Ordering::SeqCst) {
                warn!("Notification stream ended");
            } else {
                debug!("Notification listener stopped");
            }
        });

        *self.listener_handle.write() = Some(handle);

        Ok(())
    }

    /// Stop forwarding notifications.
    pub async fn stop_notifications(&self) {
        self.is_listening.store(false, Ordering::SeqCst);

        let handle = self.listener_handle.write().take();
        if let Some(handle) = handle {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Notification listener panicked: {}", e);
                }
            }
        }
    }

    /// Check if notifications are being forwarded.
    pub fn is_listening(&self) -> bool {
        self.is_listening.load(Ordering::SeqCst)
    }

    /// Get a receiver for notification events.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<NotificationEvent> {
        self.notification_tx.subscribe()
    }
}

impl Drop for CharacteristicHandler {
    fn drop(&mut self) {
        self.is_listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.listener_handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::RECEIVE_CHARACTERISTIC_UUID;

    #[test]
    fn test_notification_event_clone() {
        let event = NotificationEvent {
            characteristic_uuid: RECEIVE_CHARACTERISTIC_UUID,
            data: vec![0xC6, 0x2D, 0x05, 0x48, 0x62],
        };
        assert_eq!(event.clone(), event);
    }
}
