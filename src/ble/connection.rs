//! BLE connection management.
//!
//! Handles connecting to and disconnecting from an oximeter. A dropped link
//! is reported through the connection state; it is never re-established
//! automatically.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};

/// Connection state for an oximeter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if in a transitional state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Manages the connection to one oximeter peripheral.
pub struct ConnectionManager {
    /// The peripheral to manage.
    peripheral: Peripheral,
    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,
}

impl ConnectionManager {
    /// Create a new connection manager for a peripheral.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Connect and discover services, giving up after `timeout`.
    pub async fn connect(&self, timeout: Duration) -> Result<()> {
        let current_state = self.state();

        if current_state.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        if current_state.is_transitioning() {
            return Err(Error::ConnectionFailed {
                reason: "Connection already in progress".to_string(),
            });
        }

        self.set_state(ConnectionState::Connecting);

        let already_connected = self.peripheral.is_connected().await.unwrap_or(false);
        if already_connected {
            info!("Peripheral already connected at BLE level");
        } else {
            match tokio::time::timeout(timeout, self.peripheral.connect()).await {
                Ok(Ok(())) => info!("Connected to {}", self.peripheral.id()),
                Ok(Err(e)) => {
                    warn!("Connection attempt failed: {}", e);
                    self.set_state(ConnectionState::Disconnected);
                    return Err(Error::ConnectionFailed {
                        reason: e.to_string(),
                    });
                }
                Err(_) => {
                    warn!("Connection attempt timed out after {:?}", timeout);
                    self.set_state(ConnectionState::Disconnected);
                    // The platform may still finish the attempt in the background
                    let _ = self.peripheral.disconnect().await;
                    return Err(Error::ConnectionFailed {
                        reason: format!("timed out after {:.1}s", timeout.as_secs_f64()),
                    });
                }
            }
        }

        if let Err(e) = self.peripheral.discover_services().await {
            error!("Failed to discover services: {}", e);
            self.set_state(ConnectionState::Disconnected);
            let _ = self.peripheral.disconnect().await;
            return Err(Error::ConnectionFailed {
                reason: format!("service discovery failed: {}", e),
            });
        }

        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    /// Disconnect from the oximeter.
    pub async fn disconnect(&self) -> Result<()> {
        let current_state = self.state();

        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        match self.peripheral.disconnect().await {
            Ok(_) => {
                info!("Disconnected from {}", self.peripheral.id());
                self.set_state(ConnectionState::Disconnected);
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                self.set_state(ConnectionState::Disconnected);
                Err(Error::Bluetooth(e))
            }
        }
    }

    /// Record that the platform reported the link as lost.
    pub fn handle_disconnection(&self) {
        if self.is_connected() {
            warn!("Connection to {} lost", self.peripheral.id());
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Update the connection state, logging transitions.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = {
            let mut state = self.state.write();
            let old = *state;
            *state = new_state;
            old
        };

        if old_state != new_state {
            debug!(
                "{}: connection state changed: {} -> {}",
                self.peripheral.id(),
                old_state,
                new_state
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state() {
        assert!(!ConnectionState::Disconnected.is_connected());
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Connecting.is_transitioning());
        assert!(ConnectionState::Disconnecting.is_transitioning());
        assert!(!ConnectionState::Connected.is_transitioning());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(format!("{}", ConnectionState::Connected), "Connected");
        assert_eq!(format!("{}", ConnectionState::Disconnected), "Disconnected");
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }
}
