//! Si46xx Command Protocol
//!
//! Opcodes and argument encoding, chip-select framing of commands and
//! replies, and decoding of the replies this driver understands.
//!
//! Everything here except [`frame`] is pure: encoders and decoders work on
//! byte arrays and never touch the bus.

pub mod command;
pub mod frame;
pub mod reply;
pub mod service_list;
