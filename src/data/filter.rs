//! Reading filters.

use super::reading::{OximeterReading, MAX_SIGNAL_STRENGTH};
use crate::error::{Error, Result};

/// Drops readings that do not meet a quality threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadingFilter {
    /// Minimum signal strength (0-8) a reading must have.
    pub min_signal_strength: Option<u8>,
}

impl ReadingFilter {
    /// Create a filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the threshold exceeds
    /// [`MAX_SIGNAL_STRENGTH`].
    pub fn new(min_signal_strength: Option<u8>) -> Result<Self> {
        if let Some(min) = min_signal_strength {
            if min > MAX_SIGNAL_STRENGTH {
                return Err(Error::InvalidParameter {
                    name: "min_signal_strength".to_string(),
                    value: min.to_string(),
                });
            }
        }

        Ok(Self {
            min_signal_strength,
        })
    }

    /// Check if a reading passes the filter.
    pub fn accepts(&self, reading: &OximeterReading) -> bool {
        match self.min_signal_strength {
            Some(min) => reading.signal_strength >= min,
            None => true,
        }
    }
}
