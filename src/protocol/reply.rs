//! Reply decoders
//!
//! Offsets are into the raw reply as read from the bus, status bytes
//! included. Every fixed reply starts with the four status bytes decoded by
//! [`StatusFlags`].

use core::fmt;

/// Power-up state reported in STATUS3
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpState {
    /// Held in reset or not yet powered up
    Reset,
    /// Reserved encoding
    Reserved,
    /// Bootloader running, ready for images
    Bootloader,
    /// Application image running
    Application,
}

impl PowerUpState {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Reset,
            1 => Self::Reserved,
            2 => Self::Bootloader,
            _ => Self::Application,
        }
    }
}

/// Interrupt and error flags common to every reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusFlags {
    /// Clear to send the next command
    pub cts: bool,
    /// The previous command was rejected
    pub err_cmd: bool,
    /// Digital radio link change interrupt
    pub dacq_int: bool,
    /// Digital service interrupt
    pub dsrv_int: bool,
    /// Received signal quality interrupt
    pub rsq_int: bool,
    /// Seek/tune complete
    pub stc_int: bool,
    /// Power-up state
    pub pup_state: PowerUpState,
}

impl StatusFlags {
    /// Decode from the leading bytes of a reply; missing bytes read as zero
    #[must_use]
    pub fn from_reply(reply: &[u8]) -> Self {
        let status0 = reply.first().copied().unwrap_or(0);
        let status3 = reply.get(3).copied().unwrap_or(0);
        Self {
            cts: status0 & 0x80 != 0,
            err_cmd: status0 & 0x40 != 0,
            dacq_int: status0 & 0x20 != 0,
            dsrv_int: status0 & 0x10 != 0,
            rsq_int: status0 & 0x02 != 0,
            stc_int: status0 & 0x01 != 0,
            pup_state: PowerUpState::from_bits(status3 >> 6),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for StatusFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Status(cts={}, err={}, stc={})",
            self.cts,
            self.err_cmd,
            self.stc_int
        );
    }
}

/// `FM_RSQ_STATUS` signal quality
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FmRsqStatus {
    /// Status flags
    pub status: StatusFlags,
    /// Signal to noise ratio in dB
    pub snr_db: i8,
    /// Received signal strength in dBµV
    pub rssi_dbuv: i8,
    /// Frequency offset, raw field doubled
    pub freq_offset: i16,
    /// Antenna capacitance in use
    pub read_antenna_cap: u16,
}

impl FmRsqStatus {
    /// Decode a 20-byte reply
    #[must_use]
    pub fn decode(reply: &[u8; 20]) -> Self {
        Self {
            status: StatusFlags::from_reply(reply),
            snr_db: i8::from_ne_bytes([reply[10]]),
            rssi_dbuv: i8::from_ne_bytes([reply[9]]),
            freq_offset: i16::from(i8::from_ne_bytes([reply[8]])) * 2,
            read_antenna_cap: u16::from_le_bytes([reply[12], reply[13]]),
        }
    }
}

impl fmt::Display for FmRsqStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SNR: {} dB, RSSI: {} dBuV, FREQOFF: {}, READANTCAP: {}",
            self.snr_db, self.rssi_dbuv, self.freq_offset, self.read_antenna_cap
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FmRsqStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "SNR: {} dB, RSSI: {} dBuV, FREQOFF: {}, READANTCAP: {}",
            self.snr_db,
            self.rssi_dbuv,
            self.freq_offset,
            self.read_antenna_cap
        );
    }
}

/// `FM_RDS_STATUS` synchronization state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FmRdsStatus {
    /// Status flags
    pub status: StatusFlags,
    /// RDS decoder synchronized
    pub rds_sync: bool,
}

impl FmRdsStatus {
    /// Decode a 20-byte reply
    #[must_use]
    pub fn decode(reply: &[u8; 20]) -> Self {
        Self {
            status: StatusFlags::from_reply(reply),
            rds_sync: reply[5] & 0x02 != 0,
        }
    }
}

impl fmt::Display for FmRdsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RDSSYNC: {}", u8::from(self.rds_sync))
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FmRdsStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RDSSYNC: {}", self.rds_sync);
    }
}

/// `DAB_DIGRAD_STATUS` link quality
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DabDigradStatus {
    /// Status flags
    pub status: StatusFlags,
    /// Ensemble acquired
    pub acquired: bool,
    /// Tuned frequency carries a valid DAB signal
    pub valid: bool,
    /// Received signal strength in dBµV
    pub rssi: i8,
    /// Signal to noise ratio in dB
    pub snr: i8,
    /// Fast information channel quality, 0..=100
    pub fic_quality: u8,
    /// Carrier to noise ratio in dB
    pub cnr: u8,
    /// Frequency offset of the FFT window
    pub fft_offset: i8,
    /// Antenna capacitance in use
    pub antenna_cap: u16,
}

impl DabDigradStatus {
    /// Decode a 22-byte reply
    #[must_use]
    pub fn decode(reply: &[u8; 22]) -> Self {
        Self {
            status: StatusFlags::from_reply(reply),
            acquired: reply[5] & 0x04 != 0,
            valid: reply[5] & 0x01 != 0,
            rssi: i8::from_ne_bytes([reply[6]]),
            snr: i8::from_ne_bytes([reply[7]]),
            fic_quality: reply[8],
            cnr: reply[9],
            fft_offset: i8::from_ne_bytes([reply[17]]),
            antenna_cap: u16::from_le_bytes([reply[18], reply[19]]),
        }
    }
}

impl fmt::Display for DabDigradStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACQ: {}, VALID: {}, RSSI: {}, SNR: {}, FIC_QUALITY: {}, CNR: {}, FFT_OFFSET: {}, ANTCAP: {}",
            u8::from(self.acquired),
            u8::from(self.valid),
            self.rssi,
            self.snr,
            self.fic_quality,
            self.cnr,
            self.fft_offset,
            self.antenna_cap
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DabDigradStatus {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ACQ: {}, VALID: {}, RSSI: {}, SNR: {}, FIC: {}, CNR: {}, FFT: {}, ANTCAP: {}",
            self.acquired,
            self.valid,
            self.rssi,
            self.snr,
            self.fic_quality,
            self.cnr,
            self.fft_offset,
            self.antenna_cap
        );
    }
}

/// Image running on the chip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveImage {
    /// Bootloader, no application loaded
    Bootloader,
    /// FM/FM-HD radio
    FmHd,
    /// DAB radio
    Dab,
    /// T-DMB or data-only DAB
    TdmbOrDataOnly,
    /// FM-HD demodulator only
    FmHdDemod,
    /// AM-HD radio
    AmHd,
    /// AM-HD demodulator only
    AmHdDemod,
    /// DAB demodulator only
    DabDemod,
    /// Encoding not known to this driver
    Unknown(u8),
}

impl ActiveImage {
    /// Decode the `GET_SYS_STATE` image byte
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Bootloader,
            1 => Self::FmHd,
            2 => Self::Dab,
            3 => Self::TdmbOrDataOnly,
            4 => Self::FmHdDemod,
            5 => Self::AmHd,
            6 => Self::AmHdDemod,
            7 => Self::DabDemod,
            other => Self::Unknown(other),
        }
    }
}

/// `GET_SYS_STATE` result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemState {
    /// Status flags
    pub status: StatusFlags,
    /// Image currently running
    pub image: ActiveImage,
}

impl SystemState {
    /// Decode a 6-byte reply
    #[must_use]
    pub fn decode(reply: &[u8; 6]) -> Self {
        Self {
            status: StatusFlags::from_reply(reply),
            image: ActiveImage::from_byte(reply[4]),
        }
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image {:?}", self.image)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SystemState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "image {}", defmt::Debug2Format(&self.image));
    }
}

/// `GET_PART_INFO` result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PartInfo {
    /// Status flags
    pub status: StatusFlags,
    /// Chip revision
    pub chip_rev: u8,
    /// ROM identifier
    pub rom_id: u8,
    /// Part number, e.g. 4684 for the Si4684
    pub part_number: u16,
}

impl PartInfo {
    /// Decode a 22-byte reply
    #[must_use]
    pub fn decode(reply: &[u8; 22]) -> Self {
        Self {
            status: StatusFlags::from_reply(reply),
            chip_rev: reply[4],
            rom_id: reply[5],
            part_number: u16::from_le_bytes([reply[8], reply[9]]),
        }
    }
}

impl fmt::Display for PartInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Si{} rev {} rom {}",
            self.part_number, self.chip_rev, self.rom_id
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for PartInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Si{} rev {} rom {}",
            self.part_number,
            self.chip_rev,
            self.rom_id
        );
    }
}
