//! Reading pipeline.
//!
//! Turns raw notification bytes into readings and fans each accepted reading
//! out to the latest-reading cache, an optional timed collection, broadcast
//! subscribers, the console and the CSV recorder.

use std::path::PathBuf;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::data::{OximeterReading, ReadingFilter};
use crate::error::Result;
use crate::protocol::BciParser;
use crate::recording::{console, CsvRecorder};

/// Shared processing state behind a [`BerryOximeter`](crate::BerryOximeter).
#[derive(Debug)]
pub struct ReadingPipeline {
    parser: BciParser,
    filter: ReadingFilter,
    latest: Option<OximeterReading>,
    /// `Some` while a timed collection is running.
    collected: Option<Vec<OximeterReading>>,
    console_logging: bool,
    recorder: Option<CsvRecorder>,
    reading_tx: broadcast::Sender<OximeterReading>,
}

impl ReadingPipeline {
    /// Create a pipeline publishing to `reading_tx`.
    pub fn new(reading_tx: broadcast::Sender<OximeterReading>) -> Self {
        Self {
            parser: BciParser::new(),
            filter: ReadingFilter::default(),
            latest: None,
            collected: None,
            console_logging: false,
            recorder: None,
            reading_tx,
        }
    }

    /// Process a chunk of notification data.
    ///
    /// Returns the number of readings that passed the filter.
    pub fn handle_data(&mut self, data: &[u8]) -> usize {
        let readings = self.parser.add_data(data);
        let mut accepted = 0;

        for reading in readings {
            if self.handle_reading(reading) {
                accepted += 1;
            }
        }

        accepted
    }

    /// Dispatch a single decoded reading. Returns `false` if it was filtered out.
    pub fn handle_reading(&mut self, reading: OximeterReading) -> bool {
        if !self.filter.accepts(&reading) {
            return false;
        }

        if let Some(collected) = self.collected.as_mut() {
            collected.push(reading.clone());
        }

        // No receivers is fine
        let _ = self.reading_tx.send(reading.clone());

        if self.console_logging {
            console::print_reading(&reading);
        }

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(&reading) {
                warn!(
                    "Failed to write reading to {}: {}",
                    recorder.path().display(),
                    e
                );
            }
        }

        self.latest = Some(reading);
        true
    }

    /// Most recent accepted reading.
    pub fn latest(&self) -> Option<&OximeterReading> {
        self.latest.as_ref()
    }

    /// Forget the latest reading and any partial packet.
    pub fn reset(&mut self) {
        self.latest = None;
        self.parser.reset();
    }

    /// Drop any partial packet, keeping the latest reading.
    ///
    /// Used when notifications were lost, so the next packet cannot be
    /// completed with bytes from a later one.
    pub fn resync(&mut self) {
        if self.parser.pending() > 0 {
            debug!("Dropping {} bytes of partial packet", self.parser.pending());
        }
        self.parser.reset();
    }

    /// Replace the reading filter.
    pub fn set_filter(&mut self, filter: ReadingFilter) {
        self.filter = filter;
    }

    /// Enable or disable console output.
    pub fn set_console_logging(&mut self, enabled: bool) {
        self.console_logging = enabled;
    }

    /// Start a new timed collection, discarding any unfinished one.
    pub fn start_collecting(&mut self) {
        if self.collected.is_some() {
            debug!("Restarting reading collection");
        }
        self.collected = Some(Vec::new());
    }

    /// End the current collection and return its readings.
    pub fn finish_collecting(&mut self) -> Vec<OximeterReading> {
        self.collected.take().unwrap_or_default()
    }

    /// Check if a collection is running.
    pub fn is_collecting(&self) -> bool {
        self.collected.is_some()
    }

    /// Start recording to `path`, closing any existing recording first.
    pub fn start_recording(&mut self, path: PathBuf) -> Result<PathBuf> {
        if let Some(previous) = self.stop_recording() {
            debug!("Closed previous recording {}", previous.display());
        }

        let recorder = CsvRecorder::create(path)?;
        let path = recorder.path().to_path_buf();
        self.recorder = Some(recorder);
        Ok(path)
    }

    /// Stop recording, returning the path that was written.
    pub fn stop_recording(&mut self) -> Option<PathBuf> {
        let recorder = self.recorder.take()?;
        let path = recorder.path().to_path_buf();

        if let Err(e) = recorder.finish() {
            warn!("Failed to close {}: {}", path.display(), e);
        }

        Some(path)
    }

    /// Path of the active recording.
    pub fn recording_path(&self) -> Option<PathBuf> {
        self.recorder.as_ref().map(|r| r.path().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReadingStatus;
    use crate::recording::CSV_HEADER;
    use pretty_assertions::assert_eq;

    /// SpO2 98, pulse 72, signal 6.
    const STRONG: [u8; 5] = [0xC6, 0x2D, 0x05, 0x48, 0x62];
    /// SpO2 95, pulse 80, signal 2.
    const WEAK: [u8; 5] = [0x82, 0x20, 0x01, 0x50, 0x5F];

    fn pipeline() -> (ReadingPipeline, broadcast::Receiver<OximeterReading>) {
        let (tx, rx) = broadcast::channel(16);
        (ReadingPipeline::new(tx), rx)
    }

    #[test]
    fn test_handle_data_updates_latest_and_broadcasts() {
        let (mut pipeline, mut rx) = pipeline();
        assert!(pipeline.latest().is_none());

        assert_eq!(pipeline.handle_data(&STRONG), 1);

        let latest = pipeline.latest().unwrap();
        assert_eq!(latest.spo2, Some(98));
        assert_eq!(latest.status, ReadingStatus::Reading);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.pulse_rate, Some(72));
    }

    #[test]
    fn test_filter_drops_weak_readings() {
        let (mut pipeline, mut rx) = pipeline();
        pipeline.set_filter(ReadingFilter::new(Some(4)).unwrap());

        let mut data = WEAK.to_vec();
        data.extend_from_slice(&STRONG);
        assert_eq!(pipeline.handle_data(&data), 1);

        assert_eq!(rx.try_recv().unwrap().signal_strength, 6);
        assert!(rx.try_recv().is_err());

        // Weak reading never becomes the latest
        pipeline.handle_data(&WEAK);
        assert_eq!(pipeline.latest().unwrap().signal_strength, 6);
    }

    #[test]
    fn test_collection_only_while_collecting() {
        let (mut pipeline, _rx) = pipeline();

        pipeline.handle_data(&STRONG);
        pipeline.start_collecting();
        assert!(pipeline.is_collecting());
        pipeline.handle_data(&WEAK);
        pipeline.handle_data(&STRONG);

        let collected = pipeline.finish_collecting();
        assert!(!pipeline.is_collecting());
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[0].spo2, Some(95));

        pipeline.handle_data(&STRONG);
        assert!(pipeline.finish_collecting().is_empty());
    }

    #[test]
    fn test_restart_collection_discards_previous() {
        let (mut pipeline, _rx) = pipeline();
        pipeline.start_collecting();
        pipeline.handle_data(&STRONG);
        pipeline.start_collecting();
        pipeline.handle_data(&WEAK);
        assert_eq!(pipeline.finish_collecting().len(), 1);
    }

    #[test]
    fn test_recording_rows_follow_filter() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _rx) = pipeline();
        pipeline.set_filter(ReadingFilter::new(Some(3)).unwrap());

        let path = pipeline
            .start_recording(dir.path().join("run.csv"))
            .unwrap();
        assert_eq!(pipeline.recording_path(), Some(path.clone()));

        pipeline.handle_data(&STRONG);
        pipeline.handle_data(&WEAK);
        pipeline.handle_data(&STRONG);

        assert_eq!(pipeline.stop_recording(), Some(path.clone()));
        assert_eq!(pipeline.stop_recording(), None);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].ends_with(",98,72,45,6,reading,true"));
    }

    #[test]
    fn test_start_recording_replaces_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _rx) = pipeline();

        let first = pipeline.start_recording(dir.path().join("a.csv")).unwrap();
        pipeline.handle_data(&STRONG);
        let second = pipeline.start_recording(dir.path().join("b.csv")).unwrap();
        pipeline.handle_data(&STRONG);
        pipeline.handle_data(&STRONG);
        pipeline.stop_recording();

        let rows = |p: &PathBuf| std::fs::read_to_string(p).unwrap().lines().count();
        assert_eq!(rows(&first), 2);
        assert_eq!(rows(&second), 3);
    }

    #[test]
    fn test_csv_write_failure_keeps_pipeline_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.csv");
        std::fs::write(&path, "").unwrap();

        let (mut pipeline, mut rx) = pipeline();
        pipeline.recorder = Some(CsvRecorder::open_read_only(&path).unwrap());

        assert_eq!(pipeline.handle_data(&STRONG), 1);
        assert_eq!(pipeline.handle_data(&WEAK), 1);

        assert_eq!(rx.try_recv().unwrap().spo2, Some(98));
        assert_eq!(rx.try_recv().unwrap().spo2, Some(95));
        assert_eq!(pipeline.latest().unwrap().spo2, Some(95));
        assert_eq!(pipeline.recording_path(), Some(path));
    }

    #[test]
    fn test_resync_drops_partial_packet_only() {
        let (mut pipeline, _rx) = pipeline();
        pipeline.handle_data(&STRONG);
        pipeline.handle_data(&WEAK[..2]);
        pipeline.resync();

        assert_eq!(pipeline.latest().unwrap().spo2, Some(98));
        // The tail of the lost packet must not complete the earlier header
        assert_eq!(pipeline.handle_data(&STRONG[2..]), 0);
        assert_eq!(pipeline.latest().unwrap().spo2, Some(98));
    }

    #[test]
    fn test_reset_clears_latest() {
        let (mut pipeline, _rx) = pipeline();
        pipeline.handle_data(&STRONG);
        pipeline.handle_data(&STRONG[..3]);
        pipeline.reset();
        assert!(pipeline.latest().is_none());

        // The dangling partial packet was dropped, so this tail yields nothing
        assert_eq!(pipeline.handle_data(&STRONG[3..]), 0);
    }
}
