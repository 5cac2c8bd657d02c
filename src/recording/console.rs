//! Console output of readings.

use std::fmt::Write as _;
use std::io::Write as _;

use crate::data::OximeterReading;

/// Format a reading as a single console status line.
///
/// ```
/// use berry_oximeter::recording::format_console_line;
/// # use berry_oximeter::{OximeterReading, ReadingStatus};
/// # use chrono::{Local, TimeZone};
/// let reading = OximeterReading {
///     timestamp: Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 5).unwrap(),
///     spo2: Some(98),
///     pulse_rate: Some(72),
///     pleth: Some(45),
///     bar_graph: 5,
///     signal_strength: 6,
///     status: ReadingStatus::Reading,
///     pulse_beep: false,
/// };
/// assert_eq!(
///     format_console_line(&reading),
///     "[09:30:05.000] SpO2: 98% Pulse: 72 BPM Pleth:  45 Signal: 6/8 "
/// );
/// ```
pub fn format_console_line(reading: &OximeterReading) -> String {
    let mut line = format!("[{}] ", reading.timestamp.format("%H:%M:%S%.3f"));

    match reading.spo2 {
        Some(spo2) => {
            let _ = write!(line, "SpO2: {}% ", spo2);
        }
        None => line.push_str("SpO2: --- "),
    }

    match reading.pulse_rate {
        Some(rate) => {
            let _ = write!(line, "Pulse: {} BPM ", rate);
        }
        None => line.push_str("Pulse: --- BPM "),
    }

    if let Some(pleth) = reading.pleth {
        let _ = write!(line, "Pleth: {:3} ", pleth);
    }

    let _ = write!(line, "Signal: {}/8 ", reading.signal_strength);

    if !reading.status.is_reading() {
        let _ = write!(line, "[{}] ", reading.status.as_str().to_uppercase());
    }

    if reading.pulse_beep {
        line.push_str("♥ ");
    }

    line
}

/// Print a reading to stdout, overwriting the current terminal line.
pub(crate) fn print_reading(reading: &OximeterReading) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "\r{}", format_console_line(reading));
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReadingStatus;
    use chrono::{Local, TimeZone};
    use pretty_assertions::assert_eq;

    fn reading() -> OximeterReading {
        OximeterReading {
            timestamp: Local.with_ymd_and_hms(2024, 3, 1, 14, 2, 59).unwrap(),
            spo2: Some(97),
            pulse_rate: Some(101),
            pleth: Some(7),
            bar_graph: 2,
            signal_strength: 8,
            status: ReadingStatus::Reading,
            pulse_beep: true,
        }
    }

    #[test]
    fn test_full_line_with_beep() {
        assert_eq!(
            format_console_line(&reading()),
            "[14:02:59.000] SpO2: 97% Pulse: 101 BPM Pleth:   7 Signal: 8/8 ♥ "
        );
    }

    #[test]
    fn test_missing_values_and_status() {
        let mut reading = reading();
        reading.spo2 = None;
        reading.pulse_rate = None;
        reading.pleth = None;
        reading.signal_strength = 0;
        reading.status = ReadingStatus::NoFinger;
        reading.pulse_beep = false;

        assert_eq!(
            format_console_line(&reading),
            "[14:02:59.000] SpO2: --- Pulse: --- BPM Signal: 0/8 [NO_FINGER] "
        );
    }
}
