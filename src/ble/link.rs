//! The transport seam between [`BerryOximeter`](crate::BerryOximeter) and BLE.

use async_trait::async_trait;
use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::ble::characteristics::{CharacteristicHandler, NotificationEvent};
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::ble::uuids::RECEIVE_CHARACTERISTIC_UUID;
use crate::error::{Error, Result};

/// A connection to an oximeter that produces notification data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OximeterLink: Send + Sync {
    /// Address or platform identifier of the device.
    fn identifier(&self) -> String;

    /// Check if the link is up and delivering notifications.
    fn is_connected(&self) -> bool;

    /// Current state of the underlying connection.
    fn connection_state(&self) -> ConnectionState;

    /// Establish the link, giving up after `timeout`.
    async fn connect(&self, timeout: Duration) -> Result<()>;

    /// Subscribe to the receive characteristic and return its notifications.
    async fn start_notifications(&self) -> Result<broadcast::Receiver<NotificationEvent>>;

    /// Stop notifications and tear the link down.
    async fn disconnect(&self) -> Result<()>;
}

/// [`OximeterLink`] over a btleplug peripheral.
pub struct BleLink {
    identifier: String,
    connection: ConnectionManager,
    characteristics: CharacteristicHandler,
}

impl BleLink {
    /// Wrap a discovered peripheral.
    pub fn new(identifier: impl Into<String>, peripheral: Peripheral, capacity: usize) -> Self {
        Self {
            identifier: identifier.into(),
            characteristics: CharacteristicHandler::new(peripheral.clone(), capacity),
            connection: ConnectionManager::new(peripheral),
        }
    }
}

#[async_trait]
impl OximeterLink for BleLink {
    fn identifier(&self) -> String {
        self.identifier.clone()
    }

    fn is_connected(&self) -> bool {
        if !self.connection.is_connected() {
            return false;
        }

        // The listener exits when the platform drops the link
        if !self.characteristics.is_listening() {
            self.connection.handle_disconnection();
            return false;
        }

        true
    }

    fn connection_state(&self) -> ConnectionState {
        // Refresh the state if the notification listener has exited
        self.is_connected();
        self.connection.state()
    }

    async fn connect(&self, timeout: Duration) -> Result<()> {
        self.connection.connect(timeout).await?;

        let found = self.characteristics.discover_characteristics();
        debug!(
            "{} characteristics on {}",
            found,
            self.connection.peripheral().id()
        );

        if !self
            .characteristics
            .has_characteristic(&RECEIVE_CHARACTERISTIC_UUID)
        {
            return Err(Error::CharacteristicNotFound {
                uuid: RECEIVE_CHARACTERISTIC_UUID.to_string(),
            });
        }

        Ok(())
    }

    async fn start_notifications(&self) -> Result<broadcast::Receiver<NotificationEvent>> {
        // Subscribe before the listener starts so no early packet is missed
        let rx = self.characteristics.subscribe_notifications();

        self.characteristics
            .subscribe(&RECEIVE_CHARACTERISTIC_UUID)
            .await?;
        self.characteristics.start_notifications().await?;

        Ok(rx)
    }

    async fn disconnect(&self) -> Result<()> {
        if self.connection.is_connected() {
            if let Err(e) = self
                .characteristics
                .unsubscribe(&RECEIVE_CHARACTERISTIC_UUID)
                .await
            {
                warn!("Failed to unsubscribe: {}", e);
            }
        }

        self.characteristics.stop_notifications().await;
        self.connection.disconnect().await
    }
}
