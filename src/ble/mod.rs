//! BLE communication module.
//!
//! This module provides low-level Bluetooth Low Energy functionality
//! for discovering and communicating with BerryMed oximeters.

pub mod characteristics;
pub mod connection;
pub mod link;
pub mod scanner;
pub mod uuids;

pub use characteristics::{CharacteristicHandler, NotificationEvent};
pub use connection::{ConnectionManager, ConnectionState};
pub use link::{BleLink, OximeterLink};
pub use scanner::{BleScanner, DeviceTarget, DiscoveredDevice};
pub use uuids::*;
