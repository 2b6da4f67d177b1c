//! Error types for the Si46xx driver.

use core::fmt;

/// Result type alias for driver operations, generic over the transport error.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Errors that can occur while driving the chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus transport failed.
    Transport(E),

    /// The firmware image source failed or ran short.
    Image(ImageError),

    /// A command argument was rejected before anything was sent.
    InvalidArgument(ArgumentError),

    /// A polled reply never became ready.
    ProtocolTimeout {
        /// Number of queries issued
        attempts: u16,
    },

    /// A reply declared more data than it carried.
    MalformedResponse(MalformedResponse),
}

impl<E> Error<E> {
    /// Check if this is an I/O failure (bus transport or firmware source).
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Image(_))
    }
}

impl<E> From<ImageError> for Error<E> {
    fn from(err: ImageError) -> Self {
        Error::Image(err)
    }
}

impl<E> From<ArgumentError> for Error<E> {
    fn from(err: ArgumentError) -> Self {
        Error::InvalidArgument(err)
    }
}

impl<E> From<MalformedResponse> for Error<E> {
    fn from(err: MalformedResponse) -> Self {
        Error::MalformedResponse(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport(e) => write!(f, "Transport error: {e:?}"),
            Error::Image(e) => write!(f, "Firmware image error: {e}"),
            Error::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            Error::ProtocolTimeout { attempts } => {
                write!(f, "Reply not ready after {attempts} attempts")
            }
            Error::MalformedResponse(e) => write!(f, "Malformed response: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Transport(_) => defmt::write!(f, "Transport"),
            Error::Image(e) => defmt::write!(f, "Image({})", e),
            Error::InvalidArgument(e) => defmt::write!(f, "InvalidArgument({})", e),
            Error::ProtocolTimeout { attempts } => {
                defmt::write!(f, "ProtocolTimeout({})", attempts);
            }
            Error::MalformedResponse(e) => defmt::write!(f, "MalformedResponse({})", e),
        }
    }
}

/// Firmware image source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    /// The source ended before the declared length.
    Truncated {
        /// Declared image length
        expected: usize,
        /// Bytes delivered before the source ran dry
        received: usize,
    },

    /// The source reported an I/O error.
    Io(embedded_io::ErrorKind),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Truncated { expected, received } => {
                write!(f, "image truncated: expected {expected} bytes, got {received}")
            }
            ImageError::Io(kind) => write!(f, "image source I/O error: {kind:?}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ImageError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ImageError::Truncated { expected, received } => {
                defmt::write!(f, "truncated {}/{}", received, expected);
            }
            ImageError::Io(_) => defmt::write!(f, "io"),
        }
    }
}

/// Arguments rejected by a command encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentError {
    /// Frequency list length outside 1..=48.
    FrequencyListLength(usize),

    /// FM frequency does not fit the 10 kHz field.
    FrequencyOutOfRange {
        /// Requested frequency in kHz
        khz: u32,
    },

    /// Service index past the end of the service list.
    ServiceIndex {
        /// Requested index
        index: usize,
        /// Number of services in the list
        len: usize,
    },

    /// Command frame exceeds the transport's maximum transfer.
    FrameTooLong {
        /// Frame length in bytes
        len: usize,
        /// Maximum accepted length
        max: usize,
    },
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentError::FrequencyListLength(n) => {
                write!(f, "frequency list must hold 1 to 48 entries, got {n}")
            }
            ArgumentError::FrequencyOutOfRange { khz } => {
                write!(f, "frequency {khz} kHz out of range")
            }
            ArgumentError::ServiceIndex { index, len } => {
                write!(f, "service index {index} out of range for {len} services")
            }
            ArgumentError::FrameTooLong { len, max } => {
                write!(f, "frame of {len} bytes exceeds maximum {max}")
            }
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ArgumentError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ArgumentError::FrequencyListLength(n) => defmt::write!(f, "freq list len {}", n),
            ArgumentError::FrequencyOutOfRange { khz } => defmt::write!(f, "freq {} kHz", khz),
            ArgumentError::ServiceIndex { index, len } => {
                defmt::write!(f, "service {} of {}", index, len);
            }
            ArgumentError::FrameTooLong { len, max } => {
                defmt::write!(f, "frame {} > {}", len, max);
            }
        }
    }
}

/// Reply contents inconsistent with their own header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedResponse {
    /// Declared records extend past the received bytes.
    Truncated {
        /// Number of services declared in the header
        declared: u8,
        /// Bytes needed to hold every declared record
        required: usize,
        /// Bytes actually received
        received: usize,
    },

    /// Declared service count exceeds the list capacity.
    TooManyServices {
        /// Number of services declared in the header
        declared: u8,
        /// Capacity of the service list
        capacity: usize,
    },
}

impl fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedResponse::Truncated {
                declared,
                required,
                received,
            } => write!(
                f,
                "{declared} services need {required} bytes, only {received} received"
            ),
            MalformedResponse::TooManyServices { declared, capacity } => {
                write!(f, "{declared} services exceed capacity {capacity}")
            }
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for MalformedResponse {
    fn format(&self, f: defmt::Formatter) {
        match self {
            MalformedResponse::Truncated {
                declared,
                required,
                received,
            } => defmt::write!(f, "{} services, {}/{} bytes", declared, received, required),
            MalformedResponse::TooManyServices { declared, capacity } => {
                defmt::write!(f, "{} services > {}", declared, capacity);
            }
        }
    }
}
