//! Reading output: console lines and CSV files.

pub mod console;
pub mod csv;

pub use self::console::format_console_line;
pub use self::csv::{default_log_path, format_csv_row, CsvRecorder, CSV_HEADER};
