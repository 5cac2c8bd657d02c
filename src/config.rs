//! Oximeter configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::ble::uuids::DEVICE_NAME;

/// Settings for a [`BerryOximeter`](crate::BerryOximeter).
///
/// ```
/// use berry_oximeter::OximeterConfig;
/// use std::time::Duration;
///
/// let config = OximeterConfig::default()
///     .with_scan_timeout(Duration::from_secs(5))
///     .with_min_signal_strength(Some(4))
///     .with_console_logging(true);
/// assert_eq!(config.device_name, "BerryMed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OximeterConfig {
    /// Advertised local name to look for when no address is given.
    pub device_name: String,
    /// How long to scan before giving up on finding the device.
    pub scan_timeout: Duration,
    /// How long a connection attempt may take.
    pub connect_timeout: Duration,
    /// Default wait used by `get_reading_default`.
    pub reading_timeout: Duration,
    /// Directory for auto-named CSV recordings.
    pub data_dir: PathBuf,
    /// Minimum signal strength (0-8) for a reading to be accepted.
    pub min_signal_strength: Option<u8>,
    /// Print each reading to stdout.
    pub console_logging: bool,
    /// Capacity of the reading broadcast channel.
    pub channel_capacity: usize,
}

impl Default for OximeterConfig {
    fn default() -> Self {
        Self {
            device_name: DEVICE_NAME.to_string(),
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            reading_timeout: Duration::from_secs(5),
            data_dir: PathBuf::from("data"),
            min_signal_strength: None,
            console_logging: false,
            channel_capacity: 256,
        }
    }
}

impl OximeterConfig {
    /// Set the advertised name to search for.
    pub fn with_device_name(mut self, name: impl Into<String>) -> Self {
        self.device_name = name.into();
        self
    }

    /// Set the scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default reading timeout.
    pub fn with_reading_timeout(mut self, timeout: Duration) -> Self {
        self.reading_timeout = timeout;
        self
    }

    /// Set the directory for auto-named recordings.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the minimum signal strength.
    pub fn with_min_signal_strength(mut self, min: Option<u8>) -> Self {
        self.min_signal_strength = min;
        self
    }

    /// Enable or disable console output.
    pub fn with_console_logging(mut self, enabled: bool) -> Self {
        self.console_logging = enabled;
        self
    }

    /// Set the reading broadcast capacity (at least 1).
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OximeterConfig::default();
        assert_eq!(config.device_name, "BerryMed");
        assert_eq!(config.scan_timeout, Duration::from_secs(10));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reading_timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.min_signal_strength, None);
        assert!(!config.console_logging);
    }

    #[test]
    fn test_channel_capacity_floor() {
        let config = OximeterConfig::default().with_channel_capacity(0);
        assert_eq!(config.channel_capacity, 1);
    }
}
