//! BerryOximeter struct and methods.
//!
//! The high-level client for a single BerryMed pulse oximeter.

use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ble::characteristics::NotificationEvent;
use crate::ble::connection::ConnectionState;
use crate::ble::link::{BleLink, OximeterLink};
use crate::ble::scanner::{BleScanner, DeviceTarget};
use crate::ble::uuids::RECEIVE_CHARACTERISTIC_UUID;
use crate::config::OximeterConfig;
use crate::data::{OximeterReading, ReadingFilter};
use crate::error::{Error, Result};
use crate::pipeline::ReadingPipeline;
use crate::recording::default_log_path;

/// Callback handle for unregistering callbacks.
///
/// Dropping the handle unregisters the callback.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    /// Create a new callback handle.
    pub(crate) fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle").field("id", &self.id).finish()
    }
}

/// Client for a BerryMed pulse oximeter.
///
/// ```rust,no_run
/// use berry_oximeter::{BerryOximeter, Result};
/// use std::time::Duration;
///
/// # async fn run() -> Result<()> {
/// let oximeter = BerryOximeter::new();
/// oximeter.connect(None).await?;
///
/// let reading = oximeter.get_reading(Duration::from_secs(5)).await?;
/// println!("SpO2: {:?}%  Pulse: {:?} BPM", reading.spo2, reading.pulse_rate);
///
/// oximeter.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct BerryOximeter {
    /// Settings.
    config: OximeterConfig,
    /// Active link, if connected.
    link: RwLock<Option<Arc<dyn OximeterLink>>>,
    /// Parser and dispatch state.
    pipeline: Arc<Mutex<ReadingPipeline>>,
    /// Reading channel.
    reading_tx: broadcast::Sender<OximeterReading>,
    /// Task feeding notifications into the pipeline.
    forward_handle: Mutex<Option<JoinHandle<()>>>,
    /// Callback registered by `start_streaming`.
    streaming: Mutex<Option<CallbackHandle>>,
    /// Callback ID counter.
    callback_counter: AtomicU64,
}

impl BerryOximeter {
    /// Create an oximeter client with default settings.
    pub fn new() -> Self {
        Self::with_config(OximeterConfig::default())
    }

    /// Create an oximeter client.
    ///
    /// An out-of-range `min_signal_strength` is ignored with a warning; use
    /// [`set_filter`](Self::set_filter) to get an error instead.
    pub fn with_config(config: OximeterConfig) -> Self {
        let (reading_tx, _) = broadcast::channel(config.channel_capacity.max(1));

        let mut pipeline = ReadingPipeline::new(reading_tx.clone());
        pipeline.set_console_logging(config.console_logging);
        match ReadingFilter::new(config.min_signal_strength) {
            Ok(filter) => pipeline.set_filter(filter),
            Err(e) => warn!("Ignoring configured filter: {}", e),
        }

        Self {
            config,
            link: RwLock::new(None),
            pipeline: Arc::new(Mutex::new(pipeline)),
            reading_tx,
            forward_handle: Mutex::new(None),
            streaming: Mutex::new(None),
            callback_counter: AtomicU64::new(0),
        }
    }

    /// Get the settings.
    pub fn config(&self) -> &OximeterConfig {
        &self.config
    }

    // === Connection ===

    /// Check if connected to a device.
    pub fn is_connected(&self) -> bool {
        self.link
            .read()
            .as_ref()
            .map(|link| link.is_connected())
            .unwrap_or(false)
    }

    /// State of the current link, `Disconnected` when there is none.
    pub fn connection_state(&self) -> ConnectionState {
        self.link
            .read()
            .as_ref()
            .map(|link| link.connection_state())
            .unwrap_or_default()
    }

    /// Address or identifier of the connected device.
    pub fn device_address(&self) -> Option<String> {
        self.link.read().as_ref().map(|link| link.identifier())
    }

    /// Connect to an oximeter.
    ///
    /// With no address, scans for the first device advertising the configured
    /// name. Does nothing if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if the scan finds no match, and
    /// [`Error::ConnectionFailed`] if connecting or subscribing fails.
    pub async fn connect(&self, address: Option<&str>) -> Result<()> {
        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        let target = match address {
            Some(address) => DeviceTarget::Address(address.to_string()),
            None => DeviceTarget::Name(self.config.device_name.clone()),
        };

        let scanner = BleScanner::new().await?;
        let device = scanner.find(&target, self.config.scan_timeout).await?;

        let link = BleLink::new(
            device.identifier,
            device.peripheral,
            self.config.channel_capacity,
        );

        self.connect_with(Arc::new(link)).await
    }

    /// Connect over an already-constructed link.
    pub async fn connect_with(&self, link: Arc<dyn OximeterLink>) -> Result<()> {
        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        // Clear out a link that dropped on its own
        self.teardown().await;

        let identifier = link.identifier();
        info!("Connecting to {}", identifier);

        let notifications = match Self::open(link.as_ref(), self.config.connect_timeout).await {
            Ok(rx) => rx,
            Err(e) => {
                if let Err(cleanup) = link.disconnect().await {
                    debug!("Cleanup after failed connect: {}", cleanup);
                }
                return Err(match e {
                    e @ Error::ConnectionFailed { .. } => e,
                    other => Error::ConnectionFailed {
                        reason: other.to_string(),
                    },
                });
            }
        };

        self.pipeline.lock().reset();

        let handle = Self::spawn_forwarder(notifications, self.pipeline.clone());
        *self.forward_handle.lock() = Some(handle);
        *self.link.write() = Some(link);

        info!("Connected to {}", identifier);
        Ok(())
    }

    async fn open(
        link: &dyn OximeterLink,
        timeout: Duration,
    ) -> Result<broadcast::Receiver<NotificationEvent>> {
        link.connect(timeout).await?;
        link.start_notifications().await
    }

    fn spawn_forwarder(
        mut notifications: broadcast::Receiver<NotificationEvent>,
        pipeline: Arc<Mutex<ReadingPipeline>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match notifications.recv().await {
                    Ok(event) => {
                        if event.characteristic_uuid != RECEIVE_CHARACTERISTIC_UUID {
                            continue;
                        }
                        pipeline.lock().handle_data(&event.data);
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Dropped {} notifications, resynchronising", n);
                        pipeline.lock().resync();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Notification forwarder stopped");
        })
    }

    /// Disconnect from the device. Does nothing if not connected.
    pub async fn disconnect(&self) -> Result<()> {
        let link = self.teardown().await;

        match link {
            Some(link) => {
                info!("Disconnecting from {}", link.identifier());
                link.disconnect().await
            }
            None => Ok(()),
        }
    }

    /// Stop forwarding and detach the current link.
    async fn teardown(&self) -> Option<Arc<dyn OximeterLink>> {
        let handle = self.forward_handle.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        self.link.write().take()
    }

    // === Streaming ===

    /// Subscribe to accepted readings.
    pub fn subscribe_readings(&self) -> broadcast::Receiver<OximeterReading> {
        self.reading_tx.subscribe()
    }

    /// Register a callback for each accepted reading.
    pub fn on_reading<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&OximeterReading) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.reading_tx.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(reading) => callback(&reading),
                    Err(RecvError::Lagged(n)) => {
                        warn!("Reading callback fell behind, skipped {} readings", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }

    /// Stream readings to `callback`, replacing any previous streaming callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if not connected.
    pub fn start_streaming<F>(&self, callback: F) -> Result<()>
    where
        F: Fn(&OximeterReading) + Send + Sync + 'static,
    {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let handle = self.on_reading(callback);
        *self.streaming.lock() = Some(handle);
        Ok(())
    }

    /// Stop streaming readings.
    pub fn stop_streaming(&self) {
        self.streaming.lock().take();
    }

    /// Check if a streaming callback is registered.
    pub fn is_streaming(&self) -> bool {
        self.streaming.lock().is_some()
    }

    // === Readings ===

    /// Most recent accepted reading, if any.
    pub fn latest_reading(&self) -> Option<OximeterReading> {
        self.pipeline.lock().latest().cloned()
    }

    /// Get the latest reading, waiting up to `timeout` for the first one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if not connected and
    /// [`Error::NoData`] if nothing arrives in time.
    pub async fn get_reading(&self, timeout: Duration) -> Result<OximeterReading> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        // Subscribe first so a reading landing between the check and the wait is not lost
        let mut rx = self.reading_tx.subscribe();

        if let Some(reading) = self.latest_reading() {
            return Ok(reading);
        }

        let wait = async {
            loop {
                match rx.recv().await {
                    Ok(reading) => return Some(reading),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Some(reading)) => Ok(reading),
            _ => Err(Error::NoData { timeout }),
        }
    }

    /// [`get_reading`](Self::get_reading) with the configured timeout.
    pub async fn get_reading_default(&self) -> Result<OximeterReading> {
        self.get_reading(self.config.reading_timeout).await
    }

    /// Collect every accepted reading for `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if not connected.
    pub async fn get_readings(&self, duration: Duration) -> Result<Vec<OximeterReading>> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        self.pipeline.lock().start_collecting();
        tokio::time::sleep(duration).await;
        let readings = self.pipeline.lock().finish_collecting();

        debug!("Collected {} readings over {:?}", readings.len(), duration);
        Ok(readings)
    }

    // === Logging ===

    /// Start logging readings to a CSV file.
    ///
    /// With no filename, writes to
    /// `<data_dir>/oximeter_data_YYYYmmdd_HHMMSS.csv`. An active log is
    /// closed first. Returns the path in use.
    pub fn start_logging(&self, filename: Option<PathBuf>) -> Result<PathBuf> {
        let path = filename
            .unwrap_or_else(|| default_log_path(&self.config.data_dir, chrono::Local::now()));

        self.pipeline.lock().start_recording(path)
    }

    /// Stop logging, returning the file that was being written.
    pub fn stop_logging(&self) -> Option<PathBuf> {
        self.pipeline.lock().stop_recording()
    }

    /// Path of the active CSV log.
    pub fn logging_path(&self) -> Option<PathBuf> {
        self.pipeline.lock().recording_path()
    }

    /// Enable or disable printing each reading to stdout.
    pub fn log_to_console(&self, enabled: bool) {
        self.pipeline.lock().set_console_logging(enabled);
    }

    /// Only accept readings with at least this signal strength (0-8).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] for values above 8.
    pub fn set_filter(&self, min_signal_strength: Option<u8>) -> Result<()> {
        let filter = ReadingFilter::new(min_signal_strength)?;
        self.pipeline.lock().set_filter(filter);
        Ok(())
    }

    // === Lifecycle ===

    /// Stop streaming, stop logging and disconnect.
    pub async fn close(&self) -> Result<()> {
        self.stop_streaming();
        if let Some(path) = self.stop_logging() {
            info!("Closed log {}", path.display());
        }
        self.disconnect().await
    }
}

impl Default for BerryOximeter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BerryOximeter {
    fn drop(&mut self) {
        if let Some(handle) = self.forward_handle.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for BerryOximeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BerryOximeter")
            .field("device_address", &self.device_address())
            .field("is_connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::link::MockOximeterLink;
    use crate::data::ReadingStatus;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicBool;
    use tokio_test::assert_ok;

    /// SpO2 98, pulse 72, signal 6.
    const STRONG: [u8; 5] = [0xC6, 0x2D, 0x05, 0x48, 0x62];
    /// SpO2 95, pulse 80, signal 2.
    const WEAK: [u8; 5] = [0x82, 0x20, 0x01, 0x50, 0x5F];

    /// A mock link whose notifications are fed from the returned sender.
    fn mock_link() -> (MockOximeterLink, broadcast::Sender<NotificationEvent>) {
        mock_link_with_capacity(64)
    }

    fn mock_link_with_capacity(
        capacity: usize,
    ) -> (MockOximeterLink, broadcast::Sender<NotificationEvent>) {
        let (tx, rx) = broadcast::channel(capacity);
        let connected = Arc::new(AtomicBool::new(false));

        let mut link = MockOximeterLink::new();
        link.expect_identifier()
            .return_const("00:A0:50:11:22:33".to_string());

        let flag = connected.clone();
        link.expect_is_connected()
            .returning(move || flag.load(Ordering::SeqCst));

        let flag = connected.clone();
        link.expect_connection_state().returning(move || {
            if flag.load(Ordering::SeqCst) {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            }
        });

        let flag = connected.clone();
        link.expect_connect().returning(move |_| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        link.expect_start_notifications().return_once(move || Ok(rx));

        let flag = connected;
        link.expect_disconnect().returning(move || {
            flag.store(false, Ordering::SeqCst);
            Ok(())
        });

        (link, tx)
    }

    fn notify(tx: &broadcast::Sender<NotificationEvent>, data: &[u8]) {
        tx.send(NotificationEvent {
            characteristic_uuid: RECEIVE_CHARACTERISTIC_UUID,
            data: data.to_vec(),
        })
        .unwrap();
    }

    async fn connected() -> (BerryOximeter, broadcast::Sender<NotificationEvent>) {
        let oximeter = BerryOximeter::new();
        let (link, tx) = mock_link();
        assert_ok!(oximeter.connect_with(Arc::new(link)).await);
        (oximeter, tx)
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let oximeter = BerryOximeter::new();
        assert!(!oximeter.is_connected());
        assert!(oximeter.device_address().is_none());

        assert!(matches!(
            oximeter.get_reading(Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            oximeter.get_readings(Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            oximeter.start_streaming(|_| {}),
            Err(Error::NotConnected)
        ));

        // Disconnecting while disconnected is a no-op
        assert_ok!(oximeter.disconnect().await);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let (oximeter, _tx) = connected().await;
        assert!(oximeter.is_connected());
        assert_eq!(oximeter.connection_state(), ConnectionState::Connected);
        assert_eq!(
            oximeter.device_address().as_deref(),
            Some("00:A0:50:11:22:33")
        );

        assert_ok!(oximeter.disconnect().await);
        assert!(!oximeter.is_connected());
        assert_eq!(oximeter.connection_state(), ConnectionState::Disconnected);
        assert!(oximeter.device_address().is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connection_failed() {
        let oximeter = BerryOximeter::new();

        let mut link = MockOximeterLink::new();
        link.expect_identifier().return_const("AA".to_string());
        link.expect_connect().returning(|_| {
            Err(Error::CharacteristicNotFound {
                uuid: RECEIVE_CHARACTERISTIC_UUID.to_string(),
            })
        });
        link.expect_disconnect().times(1).returning(|| Ok(()));

        let err = oximeter.connect_with(Arc::new(link)).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed { .. }));
        assert!(err.to_string().starts_with("Failed to connect to device:"));
        assert!(!oximeter.is_connected());
    }

    #[tokio::test]
    async fn test_get_reading_waits_for_first_reading() {
        let (oximeter, tx) = connected().await;
        let oximeter = Arc::new(oximeter);

        let waiter = {
            let oximeter = oximeter.clone();
            tokio::spawn(async move { oximeter.get_reading(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        notify(&tx, &STRONG);

        let reading = waiter.await.unwrap().unwrap();
        assert_eq!(reading.spo2, Some(98));
        assert_eq!(reading.pulse_rate, Some(72));

        // Later calls return the cached latest reading immediately
        let again = oximeter.get_reading(Duration::from_millis(1)).await.unwrap();
        assert_eq!(again, reading);
    }

    #[tokio::test]
    async fn test_get_reading_times_out() {
        let (oximeter, _tx) = connected().await;
        let err = oximeter
            .get_reading(Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoData { .. }));
    }

    #[tokio::test]
    async fn test_get_reading_default_uses_configured_timeout() {
        let timeout = Duration::from_millis(30);
        let oximeter =
            BerryOximeter::with_config(OximeterConfig::default().with_reading_timeout(timeout));
        let (link, _tx) = mock_link();
        assert_ok!(oximeter.connect_with(Arc::new(link)).await);

        let started = tokio::time::Instant::now();
        let err = oximeter.get_reading_default().await.unwrap_err();
        assert!(matches!(err, Error::NoData { timeout: t } if t == timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_lost_notifications_do_not_splice_packets() {
        let oximeter = BerryOximeter::new();
        let (link, tx) = mock_link_with_capacity(1);
        assert_ok!(oximeter.connect_with(Arc::new(link)).await);
        let mut rx = oximeter.subscribe_readings();

        // Header of a weak packet reaches the parser
        notify(&tx, &WEAK[..2]);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The first of these is overwritten before the forwarder runs
        let mut lost = WEAK[2..].to_vec();
        lost.extend_from_slice(&STRONG[..2]);
        notify(&tx, &lost);
        notify(&tx, &STRONG[2..]);
        tokio::time::sleep(Duration::from_millis(20)).await;

        notify(&tx, &STRONG);

        let reading = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reading.spo2, Some(98));
        assert_eq!(reading.pulse_rate, Some(72));
        assert_eq!(reading.pleth, Some(45));
        assert_eq!(reading.signal_strength, 6);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_filter_applies_before_readings_are_seen() {
        let (oximeter, tx) = connected().await;
        assert!(oximeter.set_filter(Some(9)).is_err());
        assert_ok!(oximeter.set_filter(Some(4)));

        let mut rx = oximeter.subscribe_readings();
        notify(&tx, &WEAK);
        notify(&tx, &STRONG);

        let reading = rx.recv().await.unwrap();
        assert_eq!(reading.signal_strength, 6);
        assert_eq!(oximeter.latest_reading().unwrap().signal_strength, 6);
    }

    #[tokio::test]
    async fn test_get_readings_collects_for_duration() {
        let (oximeter, tx) = connected().await;
        let oximeter = Arc::new(oximeter);

        let collector = {
            let oximeter = oximeter.clone();
            tokio::spawn(async move { oximeter.get_readings(Duration::from_millis(200)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut chunk = STRONG.to_vec();
        chunk.extend_from_slice(&WEAK);
        notify(&tx, &chunk);
        notify(&tx, &STRONG[..2]);
        notify(&tx, &STRONG[2..]);

        let readings = collector.await.unwrap().unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[1].spo2, Some(95));
    }

    #[tokio::test]
    async fn test_streaming_callback() {
        let (oximeter, tx) = connected().await;
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();

        assert_ok!(oximeter.start_streaming(move |reading| {
            let _ = seen_tx.send(reading.status);
        }));
        assert!(oximeter.is_streaming());

        notify(&tx, &STRONG);

        let status = tokio::time::timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap();
        assert_eq!(status, Some(ReadingStatus::Reading));

        oximeter.stop_streaming();
        assert!(!oximeter.is_streaming());
    }

    #[tokio::test]
    async fn test_ignores_other_characteristics() {
        let (oximeter, tx) = connected().await;
        let mut rx = oximeter.subscribe_readings();

        tx.send(NotificationEvent {
            characteristic_uuid: crate::ble::uuids::DATA_SERVICE_UUID,
            data: STRONG.to_vec(),
        })
        .unwrap();
        notify(&tx, &WEAK);

        assert_eq!(rx.recv().await.unwrap().spo2, Some(95));
    }

    #[tokio::test]
    async fn test_logging_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let oximeter =
            BerryOximeter::with_config(OximeterConfig::default().with_data_dir(dir.path()));
        let (link, tx) = mock_link();
        assert_ok!(oximeter.connect_with(Arc::new(link)).await);

        let path = oximeter.start_logging(None).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("oximeter_data_"));
        assert_eq!(oximeter.logging_path(), Some(path.clone()));

        let mut rx = oximeter.subscribe_readings();
        notify(&tx, &STRONG);
        rx.recv().await.unwrap();

        assert_ok!(oximeter.close().await);
        assert!(!oximeter.is_connected());
        assert!(oximeter.logging_path().is_none());
        assert_eq!(oximeter.stop_logging(), None);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
