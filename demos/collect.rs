//! Stream readings to the console and a CSV file
//!
//! Run with: cargo run --example collect -- [ADDRESS] [SECONDS]

use berry_oximeter::{BerryOximeter, OximeterConfig, Result};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (minimal)
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let mut args = std::env::args().skip(1);
    let address = args.next().filter(|a| a != "-");
    let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(30);

    let config = OximeterConfig::default()
        .with_min_signal_strength(Some(2))
        .with_console_logging(true);
    let oximeter = BerryOximeter::with_config(config);

    println!("Connecting...");
    oximeter.connect(address.as_deref()).await?;
    println!(
        "Connected to {}",
        oximeter.device_address().unwrap_or_default()
    );

    let file = oximeter.start_logging(None)?;
    println!("Logging to {} for {}s. Press Ctrl+C to stop.\n", file.display(), seconds);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => println!("\nInterrupted"),
        result = oximeter.get_readings(Duration::from_secs(seconds)) => {
            let readings = result?;
            let valid: Vec<_> = readings.iter().filter(|r| r.is_valid()).collect();
            println!("\nCollected {} readings ({} valid)", readings.len(), valid.len());

            if !valid.is_empty() {
                let n = valid.len() as f64;
                let mean_spo2 = valid.iter().filter_map(|r| r.spo2).map(f64::from).sum::<f64>() / n;
                let mean_pulse =
                    valid.iter().filter_map(|r| r.pulse_rate).map(f64::from).sum::<f64>() / n;
                println!("Mean SpO2: {:.1}%  Mean pulse: {:.1} BPM", mean_spo2, mean_pulse);
            }
        }
    }

    oximeter.close().await?;
    println!("Saved {}", file.display());

    Ok(())
}
