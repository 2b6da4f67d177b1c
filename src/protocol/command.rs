//! Opcodes and argument encoders
//!
//! Each encoder returns the argument bytes that follow the opcode in a
//! command frame. Multi-byte fields are little-endian.

use core::fmt;

use heapless::Vec;

use crate::config::MAX_FREQUENCY_LIST;
use crate::error::ArgumentError;

/// Si468x command opcodes used by this driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    /// Power up the chip and set up the crystal
    PowerUp = 0x01,
    /// Carry a piece of firmware image
    HostLoad = 0x04,
    /// Prepare for a firmware image load
    LoadInit = 0x06,
    /// Boot the loaded image
    Boot = 0x07,
    /// Read part number and revision
    GetPartInfo = 0x08,
    /// Report the running image
    GetSysState = 0x09,
    /// Write a property
    SetProperty = 0x13,
    /// Tune to an FM frequency
    FmTuneFreq = 0x30,
    /// FM received signal quality
    FmRsqStatus = 0x32,
    /// FM RDS status
    FmRdsStatus = 0x34,
    /// DAB service directory
    DabGetDigitalServiceList = 0x80,
    /// Start a DAB audio/data service
    DabStartDigitalService = 0x81,
    /// Tune to an entry of the DAB frequency list
    DabTuneFreq = 0xB0,
    /// DAB digital radio link status
    DabDigradStatus = 0xB2,
    /// DAB service linking information
    DabGetServiceLinkingInfo = 0xB7,
    /// Replace the DAB frequency list
    DabSetFreqList = 0xB8,
}

impl Command {
    /// Opcode byte
    #[must_use]
    pub const fn opcode(self) -> u8 {
        self as u8
    }

    /// Length of the fixed reply read after this command, status included
    ///
    /// `HOST_LOAD` has no reply of its own and the service list reply is
    /// dynamic; both report `None`.
    #[must_use]
    pub const fn reply_len(self) -> Option<usize> {
        match self {
            Self::PowerUp
            | Self::LoadInit
            | Self::Boot
            | Self::SetProperty
            | Self::FmTuneFreq
            | Self::DabTuneFreq
            | Self::DabSetFreqList => Some(4),
            Self::DabStartDigitalService => Some(5),
            Self::GetSysState => Some(6),
            Self::FmRsqStatus | Self::FmRdsStatus => Some(20),
            Self::GetPartInfo | Self::DabDigradStatus => Some(22),
            Self::DabGetServiceLinkingInfo => Some(24),
            Self::HostLoad | Self::DabGetDigitalServiceList => None,
        }
    }

    /// Datasheet name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PowerUp => "POWER_UP",
            Self::HostLoad => "HOST_LOAD",
            Self::LoadInit => "LOAD_INIT",
            Self::Boot => "BOOT",
            Self::GetPartInfo => "GET_PART_INFO",
            Self::GetSysState => "GET_SYS_STATE",
            Self::SetProperty => "SET_PROPERTY",
            Self::FmTuneFreq => "FM_TUNE_FREQ",
            Self::FmRsqStatus => "FM_RSQ_STATUS",
            Self::FmRdsStatus => "FM_RDS_STATUS",
            Self::DabGetDigitalServiceList => "DAB_GET_DIGITAL_SERVICE_LIST",
            Self::DabStartDigitalService => "DAB_START_DIGITAL_SERVICE",
            Self::DabTuneFreq => "DAB_TUNE_FREQ",
            Self::DabDigradStatus => "DAB_DIGRAD_STATUS",
            Self::DabGetServiceLinkingInfo => "DAB_GET_SERVICE_LINKING_INFO",
            Self::DabSetFreqList => "DAB_SET_FREQ_LIST",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Command {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.name());
    }
}

/// Single zero argument byte used by argument-less commands
pub const NO_ARGS: [u8; 1] = [0];

/// `DAB_DIGRAD_STATUS` argument: acknowledge DIGRAD and STC interrupts
pub const DIGRAD_ACK_ARGS: [u8; 1] = [(1 << 3) | 1];

/// Argument length of `DAB_SET_FREQ_LIST` with a full list
pub const MAX_FREQ_LIST_ARGS: usize = 3 + 4 * MAX_FREQUENCY_LIST;

/// `SET_PROPERTY` arguments
#[must_use]
pub fn set_property(property: u16, value: u16) -> [u8; 5] {
    let p = property.to_le_bytes();
    let v = value.to_le_bytes();
    [0, p[0], p[1], v[0], v[1]]
}

/// `FM_TUNE_FREQ` arguments
///
/// The frequency is sent in 10 kHz units and must fit 16 bits.
pub fn fm_tune_freq(khz: u32, antenna_cap: u16) -> Result<[u8; 5], ArgumentError> {
    let units = u16::try_from(khz / 10).map_err(|_| ArgumentError::FrequencyOutOfRange { khz })?;
    let f = units.to_le_bytes();
    let cap = antenna_cap.to_le_bytes();
    Ok([0, f[0], f[1], cap[0], cap[1]])
}

/// `DAB_TUNE_FREQ` arguments
#[must_use]
pub fn dab_tune_freq(index: u8, antenna_cap: u8) -> [u8; 5] {
    [0, index, 0, antenna_cap, 0]
}

/// `DAB_SET_FREQ_LIST` arguments: count, two reserved bytes, then frequencies
pub fn dab_set_freq_list(frequencies: &[u32]) -> Result<Vec<u8, MAX_FREQ_LIST_ARGS>, ArgumentError> {
    let count = frequencies.len();
    if count == 0 || count > MAX_FREQUENCY_LIST {
        return Err(ArgumentError::FrequencyListLength(count));
    }

    let mut args = Vec::new();
    // Capacity covers a full list, so none of these pushes can fail
    #[allow(clippy::cast_possible_truncation)]
    let _ = args.extend_from_slice(&[count as u8, 0, 0]);
    for freq in frequencies {
        let _ = args.extend_from_slice(&freq.to_le_bytes());
    }
    Ok(args)
}

/// `DAB_START_DIGITAL_SERVICE` arguments
#[must_use]
pub fn dab_start_digital_service(service_id: u32, component_id: u32) -> [u8; 11] {
    let s = service_id.to_le_bytes();
    let c = component_id.to_le_bytes();
    [0, 0, 0, s[0], s[1], s[2], s[3], c[0], c[1], c[2], c[3]]
}

/// `DAB_GET_SERVICE_LINKING_INFO` arguments
#[must_use]
pub fn dab_service_linking_info(service_id: u32) -> [u8; 7] {
    let s = service_id.to_le_bytes();
    [0, 0, 0, s[0], s[1], s[2], s[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes() {
        assert_eq!(Command::PowerUp.opcode(), 0x01);
        assert_eq!(Command::HostLoad.opcode(), 0x04);
        assert_eq!(Command::DabGetDigitalServiceList.opcode(), 0x80);
        assert_eq!(Command::DabSetFreqList.opcode(), 0xB8);
    }

    #[test]
    fn dynamic_and_silent_commands_have_no_fixed_reply() {
        assert_eq!(Command::HostLoad.reply_len(), None);
        assert_eq!(Command::DabGetDigitalServiceList.reply_len(), None);
        assert_eq!(Command::DabGetServiceLinkingInfo.reply_len(), Some(24));
    }

    #[test]
    fn fm_tune_rejects_overflowing_frequency() {
        assert!(fm_tune_freq(655_350, 0).is_ok());
        assert_eq!(
            fm_tune_freq(655_360, 0),
            Err(ArgumentError::FrequencyOutOfRange { khz: 655_360 })
        );
    }
}
