//! BLE scanning functionality.
//!
//! Provides the scanner for discovering BerryMed oximeters.

use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};

/// What to look for while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTarget {
    /// Match the advertised local name exactly.
    Name(String),
    /// Match the MAC address or platform identifier, ignoring case.
    Address(String),
}

impl DeviceTarget {
    /// Check if a discovered device matches this target.
    pub fn matches(&self, device: &DiscoveredDevice) -> bool {
        self.matches_advertised(device.name.as_deref(), &device.address, &device.identifier)
    }

    /// Match against the advertised name, the MAC address and the platform
    /// identifier of a device.
    pub fn matches_advertised(&self, name: Option<&str>, address: &str, identifier: &str) -> bool {
        match self {
            Self::Name(target) => name == Some(target.as_str()),
            Self::Address(target) => {
                address.eq_ignore_ascii_case(target) || identifier.eq_ignore_ascii_case(target)
            }
        }
    }
}

impl std::fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{} device", name),
            Self::Address(address) => write!(f, "device at {}", address),
        }
    }
}

/// A peripheral seen during a scan.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Platform peripheral identifier (a UUID on macOS, the address elsewhere).
    pub identifier: String,
    /// Bluetooth address as reported by the platform.
    pub address: String,
    /// Advertised local name.
    pub name: Option<String>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
    /// The peripheral handle.
    pub peripheral: Peripheral,
}

impl DiscoveredDevice {
    /// `"name (address)"`, as used in "device not found" errors.
    pub fn label(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{} ({})", name, self.address))
    }
}

/// BLE scanner for discovering oximeters.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter })
    }

    /// Scan for `timeout` and return every device seen.
    pub async fn discover(&self, timeout: Duration) -> Result<Vec<DiscoveredDevice>> {
        let seen = self.scan(timeout, None).await?;
        Ok(seen.into_values().collect())
    }

    /// Scan until a device matching `target` is seen or `timeout` expires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] listing the named devices that were
    /// seen if nothing matched.
    pub async fn find(&self, target: &DeviceTarget, timeout: Duration) -> Result<DiscoveredDevice> {
        info!("Searching for {}...", target);

        let seen = self.scan(timeout, Some(target)).await?;

        if let Some(device) = seen.values().find(|d| target.matches(d)) {
            info!("Found {} ({})", target, device.identifier);
            return Ok(device.clone());
        }

        let mut available: Vec<String> = seen.values().filter_map(|d| d.label()).collect();
        available.sort();

        Err(Error::DeviceNotFound {
            target: target.to_string(),
            available,
        })
    }

    /// Run one scan, stopping early when `stop_on` matches.
    async fn scan(
        &self,
        timeout: Duration,
        stop_on: Option<&DeviceTarget>,
    ) -> Result<HashMap<String, DiscoveredDevice>> {
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;
        debug!("BLE scan started");

        let mut seen = HashMap::new();

        // Peripherals the platform already knows about never produce a discovery event
        for peripheral in self.adapter.peripherals().await.unwrap_or_default() {
            if let Some(device) = Self::describe(peripheral).await {
                seen.insert(device.identifier.clone(), device);
            }
        }

        let deadline = Instant::now() + timeout;
        let mut found = stop_on.map_or(false, |t| seen.values().any(|d| t.matches(d)));

        while !found {
            tokio::select! {
                event = events.next() => {
                    let Some(event) = event else { break };
                    if let Some(id) = Self::event_peripheral(event) {
                        if let Some(device) = self.lookup(&id).await {
                            found = stop_on.map_or(false, |t| t.matches(&device));
                            seen.insert(device.identifier.clone(), device);
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }
        debug!("BLE scan finished, {} devices seen", seen.len());

        Ok(seen)
    }

    fn event_peripheral(event: CentralEvent) -> Option<PeripheralId> {
        match event {
            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => Some(id),
            CentralEvent::ServicesAdvertisement { id, .. }
            | CentralEvent::ManufacturerDataAdvertisement { id, .. } => Some(id),
            _ => None,
        }
    }

    async fn lookup(&self, id: &PeripheralId) -> Option<DiscoveredDevice> {
        match self.adapter.peripheral(id).await {
            Ok(peripheral) => Self::describe(peripheral).await,
            Err(e) => {
                trace!("Failed to get peripheral {:?}: {}", id, e);
                None
            }
        }
    }

    async fn describe(peripheral: Peripheral) -> Option<DiscoveredDevice> {
        let properties = peripheral.properties().await.ok().flatten()?;

        Some(DiscoveredDevice {
            identifier: peripheral.id().to_string(),
            address: properties.address.to_string(),
            name: properties.local_name,
            rssi: properties.rssi,
            peripheral,
        })
    }
}
