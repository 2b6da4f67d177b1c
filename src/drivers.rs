//! Chip Drivers
//!
//! The Si46xx command set, firmware loading and the bring-up sequence.

pub mod loader;
pub mod sequencer;
pub mod si46xx;
