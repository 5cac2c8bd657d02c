//! Protocol module for decoding the oximeter byte stream.
//!
//! This module contains the BCI packet decoder and the streaming parser
//! that reassembles packets from BLE notifications.

pub mod bci;

pub use bci::{BciPacket, BciParser, PACKET_LEN};
