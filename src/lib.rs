//! # berry-oximeter
//!
//! A cross-platform Rust library for collecting pulse-oximeter readings from
//! BerryMed oximeters via Bluetooth Low Energy.
//!
//! The oximeter streams 5-byte BCI packets over a transparent UART service.
//! This crate finds the device, subscribes to its data characteristic,
//! reassembles the packets and hands out [`OximeterReading`]s.
//!
//! ## Features
//!
//! - **Discovery**: Find the first `BerryMed` device, or a specific address
//! - **Readings**: SpO2, pulse rate, pleth waveform, signal strength and status
//! - **Streaming**: Broadcast receivers or callbacks for every reading
//! - **Collection**: Gather all readings over a time window
//! - **Filtering**: Drop readings below a signal-strength threshold
//! - **Recording**: Console output and CSV files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use berry_oximeter::{BerryOximeter, Result};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let oximeter = BerryOximeter::new();
//!     oximeter.connect(None).await?;
//!
//!     oximeter.set_filter(Some(3))?;
//!     let file = oximeter.start_logging(None)?;
//!     println!("Logging to {}", file.display());
//!
//!     for reading in oximeter.get_readings(Duration::from_secs(10)).await? {
//!         if let (Some(spo2), Some(pulse)) = (reading.spo2, reading.pulse_rate) {
//!             println!("SpO2: {}%  Pulse: {} BPM", spo2, pulse);
//!         }
//!     }
//!
//!     oximeter.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Peripherals are identified by a UUID
//! rather than a MAC address; pass that UUID to `connect`.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data types

// Public modules
pub mod ble;
pub mod config;
pub mod data;
pub mod error;
pub mod oximeter;
pub mod pipeline;
pub mod protocol;
pub mod recording;

/// Crate version, from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports for convenience
pub use config::OximeterConfig;
pub use error::{Error, Result};
pub use oximeter::{BerryOximeter, CallbackHandle};

// Re-export commonly used types from submodules
pub use ble::connection::ConnectionState;
pub use ble::scanner::{BleScanner, DeviceTarget, DiscoveredDevice};
pub use ble::uuids::DEVICE_NAME;
pub use data::{OximeterReading, ReadingFilter, ReadingStatus, MAX_SIGNAL_STRENGTH};
pub use protocol::{BciPacket, BciParser};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<BerryOximeter>();
        let _ = std::any::TypeId::of::<OximeterReading>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<BciParser>();
        let _ = std::any::TypeId::of::<OximeterConfig>();
    }

    #[test]
    fn test_version_matches_manifest() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(VERSION.split('.').count() >= 3);
    }
}
