//! SPI bus transport
//!
//! The Si46xx talks half-duplex SPI with software chip-select framing: a
//! command frame and the following reply frame are separate chip-select
//! periods with a settle delay in between. [`Transport`] is the capability
//! the frame codec needs; [`HalTransport`] provides it on top of
//! `embedded-hal` 1.0 peripherals.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Logic level of a control line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinLevel {
    /// Driven low
    Low,
    /// Driven high
    High,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PinLevel {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "LOW"),
            Self::High => defmt::write!(f, "HIGH"),
        }
    }
}

/// Bus capability used by the frame codec
///
/// Implementations must not reorder calls: every protocol frame is built
/// from a strict sequence of select, write/transfer and deselect.
pub trait Transport {
    /// Error reported by the bus or control lines
    type Error: Debug;

    /// Assert chip-select
    fn select(&mut self) -> Result<(), Self::Error>;

    /// Release chip-select
    fn deselect(&mut self) -> Result<(), Self::Error>;

    /// Clock out bytes, discarding whatever the chip returns
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Full-duplex exchange; `buf` is sent and replaced with the reply
    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Drive the chip's reset line
    fn set_reset(&mut self, level: PinLevel) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn select(&mut self) -> Result<(), Self::Error> {
        T::select(self)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        T::deselect(self)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, data)
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        T::transfer_in_place(self, buf)
    }

    fn delay_ms(&mut self, ms: u32) {
        T::delay_ms(self, ms);
    }

    fn set_reset(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        T::set_reset(self, level)
    }
}

/// Errors from [`HalTransport`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalError<S, P> {
    /// SPI bus error
    Spi(S),
    /// Chip-select or reset pin error
    Pin(P),
}

/// [`Transport`] over an `embedded-hal` SPI bus, two GPIO outputs and a delay
///
/// Chip-select is active low. The SPI bus must be exclusively owned: the
/// chip-select line is driven here, not by the bus.
pub struct HalTransport<SPI, CS, RST, D> {
    spi: SPI,
    cs: CS,
    reset: RST,
    delay: D,
}

impl<SPI, CS, RST, D> HalTransport<SPI, CS, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin<Error = CS::Error>,
    D: DelayNs,
{
    /// Create a transport; chip-select is released immediately
    pub fn new(spi: SPI, mut cs: CS, reset: RST, delay: D) -> Result<Self, HalError<SPI::Error, CS::Error>> {
        cs.set_high().map_err(HalError::Pin)?;
        Ok(Self {
            spi,
            cs,
            reset,
            delay,
        })
    }

    /// Give back the peripherals
    pub fn release(self) -> (SPI, CS, RST, D) {
        (self.spi, self.cs, self.reset, self.delay)
    }
}

impl<SPI, CS, RST, D> Transport for HalTransport<SPI, CS, RST, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RST: OutputPin<Error = CS::Error>,
    D: DelayNs,
{
    type Error = HalError<SPI::Error, CS::Error>;

    fn select(&mut self) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(HalError::Pin)
    }

    fn deselect(&mut self) -> Result<(), Self::Error> {
        // Clock out anything still queued before ending the frame
        self.spi.flush().map_err(HalError::Spi)?;
        self.cs.set_high().map_err(HalError::Pin)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(data).map_err(HalError::Spi)
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(buf).map_err(HalError::Spi)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn set_reset(&mut self, level: PinLevel) -> Result<(), Self::Error> {
        match level {
            PinLevel::Low => self.reset.set_low(),
            PinLevel::High => self.reset.set_high(),
        }
        .map_err(HalError::Pin)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use core::convert::Infallible;

    use super::*;

    #[derive(Default)]
    struct FakeSpi {
        written: Vec<u8>,
        flushes: usize,
    }

    impl embedded_hal::spi::ErrorType for FakeSpi {
        type Error = Infallible;
    }

    impl SpiBus for FakeSpi {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            words.fill(0xFF);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(words);
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(write);
            read.fill(0xA5);
            Ok(())
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            self.written.extend_from_slice(words);
            words.fill(0xA5);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePin {
        levels: Vec<PinLevel>,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.levels.push(PinLevel::Low);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.levels.push(PinLevel::High);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ns: u64,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    fn transport() -> HalTransport<FakeSpi, FakePin, FakePin, FakeDelay> {
        HalTransport::new(
            FakeSpi::default(),
            FakePin::default(),
            FakePin::default(),
            FakeDelay::default(),
        )
        .unwrap()
    }

    #[test]
    fn chip_select_released_on_creation() {
        let (_, cs, _, _) = transport().release();
        assert_eq!(cs.levels, vec![PinLevel::High]);
    }

    #[test]
    fn frame_drives_chip_select_and_flushes() {
        let mut t = transport();
        t.select().unwrap();
        t.write(&[0x13, 0x00]).unwrap();
        let mut reply = [0u8; 2];
        t.transfer_in_place(&mut reply).unwrap();
        t.deselect().unwrap();

        assert_eq!(reply, [0xA5, 0xA5]);
        let (spi, cs, _, _) = t.release();
        assert_eq!(spi.written, vec![0x13, 0x00, 0x00, 0x00]);
        assert_eq!(spi.flushes, 1);
        assert_eq!(cs.levels, vec![PinLevel::High, PinLevel::Low, PinLevel::High]);
    }

    #[test]
    fn reset_and_delay() {
        let mut t = transport();
        t.set_reset(PinLevel::Low).unwrap();
        t.delay_ms(10);
        t.set_reset(PinLevel::High).unwrap();

        let (_, _, reset, delay) = t.release();
        assert_eq!(reset.levels, vec![PinLevel::Low, PinLevel::High]);
        assert_eq!(delay.total_ns, 10_000_000);
    }
}
