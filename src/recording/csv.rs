//! CSV recording of readings.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::data::OximeterReading;
use crate::error::Result;

/// Header row written at the top of every recording.
pub const CSV_HEADER: &str = "timestamp,spo2,pulse_rate,pleth,signal_strength,status,pulse_beep";

/// Build the default recording path, `<data_dir>/oximeter_data_YYYYmmdd_HHMMSS.csv`.
pub fn default_log_path(data_dir: &Path, now: DateTime<Local>) -> PathBuf {
    data_dir.join(format!(
        "oximeter_data_{}.csv",
        now.format("%Y%m%d_%H%M%S")
    ))
}

/// Format a reading as one CSV row (without line terminator).
pub fn format_csv_row(reading: &OximeterReading) -> String {
    fn opt<T: ToString>(value: Option<T>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    format!(
        "{},{},{},{},{},{},{}",
        reading.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        opt(reading.spo2),
        opt(reading.pulse_rate),
        opt(reading.pleth),
        reading.signal_strength,
        reading.status,
        reading.pulse_beep,
    )
}

/// Writes readings to a CSV file, flushing after every row so the file is
/// usable while a session is still running.
#[derive(Debug)]
pub struct CsvRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: u64,
}

impl CsvRecorder {
    /// Create (or truncate) `path` and write the header.
    ///
    /// Missing parent directories are created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;

        info!("Recording readings to {}", path.display());

        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    /// Wrap an existing file opened without write access, so every write fails.
    #[cfg(test)]
    pub(crate) fn open_read_only(path: &Path) -> Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(File::open(path)?),
            rows: 0,
        })
    }

    /// Append one reading.
    pub fn record(&mut self, reading: &OximeterReading) -> Result<()> {
        writeln!(self.writer, "{}", format_csv_row(reading))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows written so far, excluding the header.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and close the file, returning its path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        debug!("Closed {} after {} rows", self.path.display(), self.rows);
        Ok(self.path)
    }
}
