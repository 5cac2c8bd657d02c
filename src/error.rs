//! Error types for the berry-oximeter crate.

use std::time::Duration;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No device matching the target was seen during the scan.
    #[error("No {target} found. Available devices: {}", list_or_none(.available))]
    DeviceNotFound {
        /// Description of what was searched for, e.g. `BerryMed device`.
        target: String,
        /// Named devices that were seen, as `"name (address)"`.
        available: Vec<String>,
    },

    /// Operation requires a connection but the oximeter is not connected.
    #[error("Not connected to device")]
    NotConnected,

    /// Failed to establish a connection to the oximeter.
    #[error("Failed to connect to device: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// No reading arrived within the allowed time.
    #[error("No reading received within {} seconds", .timeout.as_secs_f64())]
    NoData {
        /// How long we waited.
        timeout: Duration,
    },

    /// Invalid data was received from the oximeter.
    #[error("Invalid data received: {context}")]
    InvalidData {
        /// Description of what was invalid about the data.
        context: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// Filesystem error while recording readings.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
