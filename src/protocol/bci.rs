//! BCI packet decoding.
//!
//! BerryMed oximeters stream 5-byte packets over the receive characteristic.
//! Only the first byte of a packet has bit 7 set, which lets the parser find
//! packet boundaries in a stream that is chopped arbitrarily into
//! notifications.
//!
//! Packet layout:
//! - Byte 0: bits 0-3 signal strength, bit 4 search too long, bit 5 probe
//!   unplugged, bit 6 pulse beep, bit 7 sync
//! - Byte 1: bits 0-6 pleth
//! - Byte 2: bits 0-3 bar graph, bit 4 no finger, bit 5 searching, bit 6
//!   pulse rate bit 7
//! - Byte 3: bits 0-6 pulse rate
//! - Byte 4: bits 0-6 SpO2

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Local};
use tracing::trace;

use crate::data::{OximeterReading, ReadingStatus, MAX_SIGNAL_STRENGTH};
use crate::error::{Error, Result};

/// Size of a BCI packet in bytes.
pub const PACKET_LEN: usize = 5;

/// Bit 7 marks the first byte of a packet.
const SYNC_BIT: u8 = 0x80;

/// Pulse rate reported while no pulse is available.
const INVALID_PULSE_RATE: u16 = 0xFF;

/// A raw decoded BCI packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BciPacket {
    /// Raw signal strength nibble (15 means unavailable).
    pub signal_strength: u8,
    /// Pulse search timed out.
    pub search_too_long: bool,
    /// Probe unplugged.
    pub probe_unplugged: bool,
    /// Pulse beep.
    pub pulse_beep: bool,
    /// Pleth sample.
    pub pleth: u8,
    /// Bar graph.
    pub bar_graph: u8,
    /// No finger / sensor off.
    pub no_finger: bool,
    /// Searching for pulse.
    pub searching: bool,
    /// Raw 8-bit pulse rate.
    pub pulse_rate: u16,
    /// Raw SpO2.
    pub spo2: u8,
}

impl BciPacket {
    /// Decode a single packet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] if the first byte lacks the sync bit or
    /// a data byte carries it.
    pub fn decode(data: &[u8; PACKET_LEN]) -> Result<Self> {
        if data[0] & SYNC_BIT == 0 {
            return Err(Error::InvalidData {
                context: format!("Missing sync bit in header byte {:#04x}", data[0]),
            });
        }

        if let Some(pos) = data[1..].iter().position(|b| b & SYNC_BIT != 0) {
            return Err(Error::InvalidData {
                context: format!("Sync bit set in data byte {}", pos + 1),
            });
        }

        let pulse_rate = u16::from(data[3] & 0x7F) | (u16::from(data[2] & 0x40) << 1);

        Ok(Self {
            signal_strength: data[0] & 0x0F,
            search_too_long: data[0] & 0x10 != 0,
            probe_unplugged: data[0] & 0x20 != 0,
            pulse_beep: data[0] & 0x40 != 0,
            pleth: data[1] & 0x7F,
            bar_graph: data[2] & 0x0F,
            no_finger: data[2] & 0x10 != 0,
            searching: data[2] & 0x20 != 0,
            pulse_rate,
            spo2: data[4] & 0x7F,
        })
    }

    /// Measurement status, most severe condition first.
    pub fn status(&self) -> ReadingStatus {
        if self.probe_unplugged {
            ReadingStatus::ProbeUnplugged
        } else if self.no_finger {
            ReadingStatus::NoFinger
        } else if self.search_too_long {
            ReadingStatus::SearchTooLong
        } else if self.searching {
            ReadingStatus::Searching
        } else {
            ReadingStatus::Reading
        }
    }

    /// Convert to a reading, mapping the device's invalid markers to `None`.
    pub fn into_reading(self, timestamp: DateTime<Local>) -> OximeterReading {
        let status = self.status();

        let spo2 = match self.spo2 {
            1..=100 => Some(self.spo2),
            _ => None,
        };

        let pulse_rate = match self.pulse_rate {
            0 | INVALID_PULSE_RATE => None,
            rate => Some(rate),
        };

        let pleth = match status {
            ReadingStatus::ProbeUnplugged | ReadingStatus::NoFinger => None,
            _ => Some(self.pleth),
        };

        let signal_strength = if self.signal_strength > MAX_SIGNAL_STRENGTH {
            0
        } else {
            self.signal_strength
        };

        OximeterReading {
            timestamp,
            spo2,
            pulse_rate,
            pleth,
            bar_graph: self.bar_graph,
            signal_strength,
            status,
            pulse_beep: self.pulse_beep,
        }
    }
}

/// Streaming parser that reassembles BCI packets from notification data.
#[derive(Debug, Default)]
pub struct BciParser {
    /// Bytes of the packet currently being assembled.
    buffer: BytesMut,
    /// Bytes dropped while hunting for a sync byte.
    discarded: u64,
}

impl BciParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(PACKET_LEN),
            discarded: 0,
        }
    }

    /// Feed notification data, timestamping readings with the current time.
    pub fn add_data(&mut self, data: &[u8]) -> Vec<OximeterReading> {
        self.add_data_at(data, Local::now())
    }

    /// Feed notification data with an explicit timestamp.
    ///
    /// Returns every packet completed by this chunk, in stream order.
    pub fn add_data_at(
        &mut self,
        data: &[u8],
        timestamp: DateTime<Local>,
    ) -> Vec<OximeterReading> {
        let mut readings = Vec::new();

        for &byte in data {
            if byte & SYNC_BIT != 0 {
                if !self.buffer.is_empty() {
                    trace!(
                        "Resync: dropping {} bytes of truncated packet",
                        self.buffer.len()
                    );
                    self.discarded += self.buffer.len() as u64;
                    self.buffer.clear();
                }
                self.buffer.put_u8(byte);
            } else if self.buffer.is_empty() {
                self.discarded += 1;
                continue;
            } else {
                self.buffer.put_u8(byte);
            }

            if self.buffer.len() == PACKET_LEN {
                let mut frame = [0u8; PACKET_LEN];
                frame.copy_from_slice(&self.buffer.split());
                match BciPacket::decode(&frame) {
                    Ok(packet) => readings.push(packet.into_reading(timestamp)),
                    Err(e) => trace!("Dropping packet {:02X?}: {}", frame, e),
                }
            }
        }

        readings
    }

    /// Number of bytes waiting for the rest of their packet.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes discarded while resynchronising.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }

    /// Drop any partial packet and reset counters.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarded = 0;
    }
}
