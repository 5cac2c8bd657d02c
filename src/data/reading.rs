//! Oximeter reading data structures.
//!
//! Contains the decoded form of a single BCI packet.

use chrono::{DateTime, Local};

/// Highest signal strength the oximeter reports.
pub const MAX_SIGNAL_STRENGTH: u8 = 8;

/// Measurement status reported alongside each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReadingStatus {
    /// Finger present and the pulse has been acquired.
    #[default]
    Reading,
    /// The oximeter is searching for a pulse.
    Searching,
    /// Pulse search has taken longer than the device allows.
    SearchTooLong,
    /// No finger in the clip, or the sensor is off.
    NoFinger,
    /// The probe is unplugged from the oximeter body.
    ProbeUnplugged,
}

impl ReadingStatus {
    /// Status as the lower-case token used in CSV files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Searching => "searching",
            Self::SearchTooLong => "search_too_long",
            Self::NoFinger => "no_finger",
            Self::ProbeUnplugged => "probe_unplugged",
        }
    }

    /// Check if the device is producing measurements.
    pub fn is_reading(&self) -> bool {
        matches!(self, Self::Reading)
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decoded oximeter sample.
///
/// The oximeter emits roughly 60 of these per second. SpO2 and pulse rate
/// change slowly; `pleth` carries the waveform.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OximeterReading {
    /// Local time at which the packet was decoded.
    pub timestamp: DateTime<Local>,

    /// Blood oxygen saturation in percent, if valid.
    pub spo2: Option<u8>,

    /// Pulse rate in beats per minute, if valid.
    pub pulse_rate: Option<u16>,

    /// Plethysmogram sample (0-100), if a finger is present.
    pub pleth: Option<u8>,

    /// Pulse-intensity bar graph (0-15).
    pub bar_graph: u8,

    /// Signal strength (0-8).
    pub signal_strength: u8,

    /// Measurement status.
    pub status: ReadingStatus,

    /// Set on the sample where the device beeps for a pulse.
    pub pulse_beep: bool,
}

impl OximeterReading {
    /// Check if this sample carries a usable SpO2 and pulse measurement.
    pub fn is_valid(&self) -> bool {
        self.status.is_reading() && self.spo2.is_some() && self.pulse_rate.is_some()
    }
}
