//! Basic example: List nearby BLE devices and highlight BerryMed oximeters
//!
//! Run with: cargo run --example discover

use berry_oximeter::{BleScanner, Result, DEVICE_NAME};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("berry_oximeter=debug".parse().unwrap()),
        )
        .init();

    println!("Scanning for BLE devices (berry-oximeter {})...", berry_oximeter::VERSION);
    println!("Make sure the oximeter is switched on!\n");

    let scanner = BleScanner::new().await?;
    let mut devices = scanner.discover(Duration::from_secs(8)).await?;
    devices.sort_by_key(|d| std::cmp::Reverse(d.rssi.unwrap_or(i16::MIN)));

    for device in &devices {
        let marker = if device.name.as_deref() == Some(DEVICE_NAME) {
            "*"
        } else {
            " "
        };

        println!(
            "{} {:<24} {:<40} RSSI: {}",
            marker,
            device.name.as_deref().unwrap_or("(unnamed)"),
            device.identifier,
            device
                .rssi
                .map(|r| format!("{} dBm", r))
                .unwrap_or_else(|| "--".to_string())
        );
    }

    let count = devices
        .iter()
        .filter(|d| d.name.as_deref() == Some(DEVICE_NAME))
        .count();
    println!("\n{} device(s) seen, {} oximeter(s).", devices.len(), count);

    Ok(())
}
