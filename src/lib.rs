//! Si46xx Digital Radio Receiver Driver
//!
//! Blocking driver for the Silicon Labs `Si468x` family of FM, FM-HD and DAB
//! receivers, as fitted to Raspberry Pi radio boards. The chip is controlled
//! over SPI with software chip-select framing and booted by streaming
//! firmware images from the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DRIVER LAYER                           │
//! │  Bring-up Sequencer  │  Command Set  │  Firmware Loader      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      PROTOCOL LAYER                          │
//! │  Frame Codec  │  Command Encoders  │  Reply / Service List   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        HAL LAYER                             │
//! │  Transport trait  │  embedded-hal SPI + GPIO + delay         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use si46xx::drivers::loader::FirmwareDir;
//! use si46xx::hal::transport::Transport;
//! use si46xx::{DeviceMode, Error, Si46xx};
//!
//! fn play_first_service<T: Transport>(radio: &mut Si46xx<T>) -> Result<(), Error<T::Error>> {
//!     radio.bring_up(DeviceMode::Dab, &mut FirmwareDir::default())?;
//!     radio.dab_set_frequency_list(&[225_648])?;
//!     radio.dab_tune_frequency(0, 0)?;
//!     let services = radio.dab_get_digital_service_list()?;
//!     if let Some(service) = services.get(0) {
//!         radio.dab_start_service(service)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! A command and its reply are two chip-select periods separated by a
//! settle delay, and nothing in the protocol ties a reply to its command.
//! [`Si46xx`] therefore owns its transport and every operation takes
//! `&mut self`; share a driver between threads only behind a lock held for
//! whole operations.
//!
//! # Features
//!
//! - `std` (default): host builds, `log` output and file-backed firmware
//! - `mock`: recording transport for host tests, implies `std`
//! - `embedded`: `no_std` builds with `defmt` output

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// The bus capability the driver needs, and its `embedded-hal` provider.
pub mod hal;

/// Wire Protocol
///
/// Command framing, argument encoders and reply decoders.
pub mod protocol;

/// Chip Drivers
///
/// Command set, firmware loader and bring-up sequence.
pub mod drivers;

/// Error types
pub mod error;

/// Shared types used across modules
pub mod types;

/// Timing constants and chip configuration
pub mod config;

/// Recording transport for host tests
#[cfg(feature = "mock")]
pub mod mock;

pub use config::Config;
pub use drivers::loader::{FirmwareArtifact, FirmwareStore, LoadSummary, MemoryFirmware};
pub use drivers::sequencer::BootReport;
pub use drivers::si46xx::Si46xx;
pub use error::{Error, Result};
pub use hal::transport::{HalTransport, PinLevel, Transport};
pub use protocol::service_list::{ServiceList, ServiceRecord};
pub use types::{DeviceMode, DeviceState};

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::{Config, PowerUpConfig, RetryPolicy};
    pub use crate::drivers::loader::{FirmwareArtifact, FirmwareStore, MemoryFirmware};
    pub use crate::drivers::si46xx::Si46xx;
    pub use crate::error::{ArgumentError, Error, ImageError, MalformedResponse};
    pub use crate::hal::transport::{PinLevel, Transport};
    pub use crate::protocol::reply::{DabDigradStatus, FmRdsStatus, FmRsqStatus, StatusFlags};
    pub use crate::protocol::service_list::{ServiceList, ServiceRecord};
    pub use crate::types::{DeviceMode, DeviceState};

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal::spi::SpiBus;
}
