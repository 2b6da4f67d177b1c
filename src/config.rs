//! Driver configuration and chip constants
//!
//! Timings, buffer sizes and firmware artifact names are centralized here.
//! Runtime-tunable settings live in [`Config`].

/// Chip-select high time before and after every read, in ms.
///
/// The chip needs about 20 µs; a millisecond is the smallest portable delay.
pub const SETTLE_DELAY_MS: u32 = 1;

/// Reset line low time and post-release wait, in ms
pub const RESET_DELAY_MS: u32 = 10;

/// Wait after `POWER_UP` before reading its status, in ms
pub const POWER_UP_DELAY_MS: u32 = 1;

/// Wait after `BOOT` before the chip accepts commands, in ms
///
/// About 63 ms for analog FM and 198 ms for DAB.
pub const BOOT_DELAY_MS: u32 = 300;

/// Wait after `LOAD_INIT`, in ms
pub const LOAD_INIT_DELAY_MS: u32 = 1;

/// Wait between `HOST_LOAD` chunks, in ms
pub const CHUNK_DELAY_MS: u32 = 1;

/// Wait after the final chunk and after its status read, in ms
pub const LOAD_FINISH_DELAY_MS: u32 = 4;

/// Largest image piece carried by one `HOST_LOAD` command
pub const HOST_LOAD_CHUNK_SIZE: usize = 2048;

/// Zero padding between the `HOST_LOAD` opcode and the image bytes
pub const HOST_LOAD_PAD: usize = 3;

/// Largest single transfer the SPI transport accepts (spidev default `bufsiz`)
pub const MAX_TRANSFER_LEN: usize = 4096;

/// Header length of a dynamic-length reply
pub const DYNAMIC_HEADER_LEN: usize = 6;

/// Length fields above this are treated as corrupt and read as zero
pub const DYNAMIC_READ_CEILING: usize = 3000;

/// Capacity of a dynamic reply buffer
pub const MAX_DYNAMIC_REPLY: usize = DYNAMIC_HEADER_LEN + DYNAMIC_READ_CEILING;

/// Maximum number of entries accepted by `DAB_SET_FREQ_LIST`
pub const MAX_FREQUENCY_LIST: usize = 48;

/// Maximum number of services held by a parsed service list
pub const MAX_SERVICES: usize = 64;

/// Service list offset of the first service record
pub const SERVICE_RECORDS_OFFSET: usize = 12;

/// Size of one service record (one service with one component)
pub const SERVICE_RECORD_LEN: usize = 28;

/// Length of a service label
pub const SERVICE_LABEL_LEN: usize = 16;

/// Default number of `DAB_GET_DIGITAL_SERVICE_LIST` attempts
pub const SERVICE_LIST_ATTEMPTS: u16 = 100;

/// Firmware artifact file names, relative to a firmware directory
pub mod firmware {
    //! Default image names shipped for the DABPi board

    /// Directory searched by default
    pub const DEFAULT_DIR: &str = "firmware";

    /// ROM patch loaded before every mode image
    pub const PATCH: &str = "rom00_patch.016.bin";

    /// FM/FM-HD radio image
    pub const FMHD: &str = "fmhd_radio_3_0_19.bif";

    /// DAB radio image
    pub const DAB: &str = "dab_radio_3_2_7.bif";
}

/// `POWER_UP` arguments
///
/// Defaults match the DABPi board: 19.2 MHz crystal driven in
/// reference-clock mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowerUpConfig {
    /// Enable the CTS interrupt (ARG1 bit 7)
    pub cts_interrupt: bool,
    /// Clock mode, 0..=3 (ARG2 bits 5:4)
    pub clock_mode: u8,
    /// Crystal trim size, 0..=15 (ARG2 bits 3:0)
    pub tr_size: u8,
    /// Crystal bias current at start-up, 10 µA steps (ARG3)
    pub ibias: u8,
    /// Crystal frequency in Hz (ARG4..ARG7)
    pub xtal_freq_hz: u32,
    /// Crystal load capacitance trim (ARG8)
    pub ctun: u8,
    /// Crystal bias current while running, 0 = same as `ibias` (ARG13)
    pub ibias_run: u8,
}

impl PowerUpConfig {
    /// Length of the encoded argument vector
    pub const ARG_LEN: usize = 15;

    /// Encode the argument vector sent after the `POWER_UP` opcode
    #[must_use]
    pub const fn encode(&self) -> [u8; Self::ARG_LEN] {
        let xtal = self.xtal_freq_hz.to_le_bytes();
        [
            if self.cts_interrupt { 0x80 } else { 0x00 },
            ((self.clock_mode & 0x03) << 4) | (self.tr_size & 0x0F),
            self.ibias,
            xtal[0],
            xtal[1],
            xtal[2],
            xtal[3],
            self.ctun,
            // ARG9 must be 0x10
            0x10,
            0x00,
            0x00,
            0x00,
            self.ibias_run,
            0x00,
            0x00,
        ]
    }
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            cts_interrupt: true,
            clock_mode: 1,
            tr_size: 7,
            ibias: 0x48,
            // 19.2 MHz nominal, trimmed for the board's crystal
            xtal_freq_hz: 0x0124_F900,
            ctun: 0x1F,
            ibias_run: 0,
        }
    }
}

/// Bounded polling of replies that may not be ready on the first query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of queries before giving up
    pub attempts: u16,
    /// Extra wait between queries, in ms
    pub delay_ms: u32,
    /// Report exhaustion as an error instead of an empty result
    pub strict: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: SERVICE_LIST_ATTEMPTS,
            delay_ms: 0,
            strict: false,
        }
    }
}

/// Runtime driver configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Arguments for `POWER_UP`
    pub power_up: PowerUpConfig,
    /// Polling of `DAB_GET_DIGITAL_SERVICE_LIST`
    pub service_list_retry: RetryPolicy,
}
