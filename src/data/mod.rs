//! Data structures for oximeter data.
//!
//! This module contains the decoded reading type and the filters applied
//! to readings before they are dispatched.

pub mod filter;
pub mod reading;

pub use filter::ReadingFilter;
pub use reading::{OximeterReading, ReadingStatus, MAX_SIGNAL_STRENGTH};
