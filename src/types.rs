//! Shared types used across the driver
//!
//! Small domain types that appear in more than one layer: receive mode
//! selection, bring-up states and a hex formatter for raw replies.

use core::fmt;

/// Receive mode selected at bring-up
///
/// Decides which mode image follows the ROM patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceMode {
    /// Analog FM with HD Radio
    Fm,
    /// DAB/DAB+
    Dab,
}

impl DeviceMode {
    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fm => "FM",
            Self::Dab => "DAB",
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DeviceMode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Bring-up progress of the chip
///
/// Transitions are strictly sequential; there is no way back except a new
/// reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceState {
    /// Reset pulse applied
    Reset,
    /// `POWER_UP` accepted
    PoweredUp,
    /// ROM patch loaded
    PatchLoaded,
    /// Mode image loaded
    ImageLoaded,
    /// `BOOT` issued and boot time elapsed
    Booted,
    /// Diagnostics read, chip accepts mode commands
    Ready,
}

impl DeviceState {
    /// All states in bring-up order
    pub const SEQUENCE: [Self; 6] = [
        Self::Reset,
        Self::PoweredUp,
        Self::PatchLoaded,
        Self::ImageLoaded,
        Self::Booted,
        Self::Ready,
    ];

    /// The state that follows this one, `None` once ready
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Reset => Some(Self::PoweredUp),
            Self::PoweredUp => Some(Self::PatchLoaded),
            Self::PatchLoaded => Some(Self::ImageLoaded),
            Self::ImageLoaded => Some(Self::Booted),
            Self::Booted => Some(Self::Ready),
            Self::Ready => None,
        }
    }

    /// Check if bring-up has completed
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reset => "Reset",
            Self::PoweredUp => "PoweredUp",
            Self::PatchLoaded => "PatchLoaded",
            Self::ImageLoaded => "ImageLoaded",
            Self::Booted => "Booted",
            Self::Ready => "Ready",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DeviceState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Formats a byte slice as contiguous lowercase hex
#[derive(Clone, Copy)]
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for HexDump<'_> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:x}", self.0);
    }
}
