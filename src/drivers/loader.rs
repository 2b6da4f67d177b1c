//! Firmware image loading
//!
//! Images are streamed to the chip's bootloader with `LOAD_INIT` followed
//! by `HOST_LOAD` frames of at most 2 KiB. The image source is any
//! [`embedded_io::Read`], so a flash partition, an in-memory slice or a file
//! on the host all work the same way.

use embedded_io::{Error as _, Read};

use crate::config::{
    firmware, CHUNK_DELAY_MS, HOST_LOAD_CHUNK_SIZE, LOAD_FINISH_DELAY_MS, LOAD_INIT_DELAY_MS,
};
use crate::error::{ImageError, Result};
use crate::hal::transport::Transport;
use crate::protocol::command::{Command, NO_ARGS};
use crate::protocol::frame::FrameBus;
use crate::protocol::reply::StatusFlags;
use crate::types::DeviceMode;

use super::si46xx::Si46xx;

/// Outcome of a completed image transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    /// `HOST_LOAD` frames sent
    pub chunks: usize,
    /// Image bytes sent, padding excluded
    pub bytes: usize,
    /// Status read after the last chunk
    pub status: StatusFlags,
}

/// Stream `len` bytes from `source` to the chip
///
/// The source must deliver exactly `len` bytes; if it runs dry first the
/// transfer stops with [`ImageError::Truncated`] and the chip is left in the
/// bootloader waiting for more data.
pub fn load_image<T, R>(bus: &mut FrameBus<T>, source: &mut R, len: usize) -> Result<LoadSummary, T::Error>
where
    T: Transport,
    R: Read,
{
    bus.write_command(Command::LoadInit, &NO_ARGS)?;
    bus.delay_ms(LOAD_INIT_DELAY_MS);

    let mut chunk = [0u8; HOST_LOAD_CHUNK_SIZE];
    let mut sent = 0;
    let mut chunks = 0;

    while sent < len {
        let want = (len - sent).min(HOST_LOAD_CHUNK_SIZE);
        let got = fill(source, &mut chunk[..want]).map_err(|e| ImageError::Io(e.kind()))?;
        if got < want {
            return Err(ImageError::Truncated {
                expected: len,
                received: sent + got,
            }
            .into());
        }

        bus.write_host_load_chunk(Command::HostLoad, &chunk[..want])?;
        sent += want;
        chunks += 1;
        bus.delay_ms(CHUNK_DELAY_MS);
    }

    bus.delay_ms(LOAD_FINISH_DELAY_MS);
    let reply: [u8; 4] = bus.read_fixed()?;
    bus.delay_ms(LOAD_FINISH_DELAY_MS);

    let status = StatusFlags::from_reply(&reply);
    if status.err_cmd {
        warn!("{} rejected by chip", Command::HostLoad);
    }
    debug!("image loaded: {} bytes in {} chunks", sent, chunks);

    Ok(LoadSummary {
        chunks,
        bytes: sent,
        status,
    })
}

/// Read until `buf` is full or the source reports end of data
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> core::result::Result<usize, R::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Firmware images needed for a bring-up
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FirmwareArtifact {
    /// ROM patch, loaded before any application image
    Patch,
    /// FM/FM-HD application image
    FmHd,
    /// DAB application image
    Dab,
}

impl FirmwareArtifact {
    /// Application image for `mode`
    #[must_use]
    pub const fn for_mode(mode: DeviceMode) -> Self {
        match mode {
            DeviceMode::Fm => Self::FmHd,
            DeviceMode::Dab => Self::Dab,
        }
    }

    /// Conventional file name of the image
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Patch => firmware::PATCH,
            Self::FmHd => firmware::FMHD,
            Self::Dab => firmware::DAB,
        }
    }
}

impl core::fmt::Display for FirmwareArtifact {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.file_name())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FirmwareArtifact {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.file_name());
    }
}

/// Source of firmware images
pub trait FirmwareStore {
    /// Readable image
    type Source: Read;

    /// Open `artifact`, returning the reader and the image length in bytes
    fn open(&mut self, artifact: FirmwareArtifact) -> core::result::Result<(Self::Source, usize), ImageError>;
}

/// Images held in memory, e.g. linked into flash
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryFirmware<'a> {
    /// ROM patch
    pub patch: &'a [u8],
    /// FM/FM-HD image
    pub fmhd: &'a [u8],
    /// DAB image
    pub dab: &'a [u8],
}

impl<'a> FirmwareStore for MemoryFirmware<'a> {
    type Source = &'a [u8];

    fn open(&mut self, artifact: FirmwareArtifact) -> core::result::Result<(Self::Source, usize), ImageError> {
        let image = match artifact {
            FirmwareArtifact::Patch => self.patch,
            FirmwareArtifact::FmHd => self.fmhd,
            FirmwareArtifact::Dab => self.dab,
        };
        Ok((image, image.len()))
    }
}

#[cfg(feature = "std")]
pub use self::fs::{FileImage, FirmwareDir};

#[cfg(feature = "std")]
mod fs {
    use std::path::{Path, PathBuf};

    use embedded_io::ErrorKind;

    use super::{FirmwareArtifact, FirmwareStore};
    use crate::config::firmware;
    use crate::error::ImageError;

    /// Images stored as files in one directory
    #[derive(Clone, Debug)]
    pub struct FirmwareDir {
        root: PathBuf,
    }

    impl FirmwareDir {
        /// Use the images in `root`
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into() }
        }

        /// Path of `artifact` inside the directory
        #[must_use]
        pub fn path(&self, artifact: FirmwareArtifact) -> PathBuf {
            self.root.join(artifact.file_name())
        }
    }

    impl Default for FirmwareDir {
        fn default() -> Self {
            Self::new(firmware::DEFAULT_DIR)
        }
    }

    impl FirmwareStore for FirmwareDir {
        type Source = FileImage;

        fn open(&mut self, artifact: FirmwareArtifact) -> Result<(FileImage, usize), ImageError> {
            FileImage::open(self.path(artifact))
        }
    }

    /// Firmware image file adapted to [`embedded_io::Read`]
    #[derive(Debug)]
    pub struct FileImage(std::fs::File);

    impl FileImage {
        /// Open `path`, returning the file and its length
        pub fn open(path: impl AsRef<Path>) -> Result<(Self, usize), ImageError> {
            let file = std::fs::File::open(path).map_err(|e| image_error(&e))?;
            let len = file.metadata().map_err(|e| image_error(&e))?.len();
            let len = usize::try_from(len).map_err(|_| ImageError::Io(ErrorKind::OutOfMemory))?;
            Ok((Self(file), len))
        }
    }

    impl embedded_io::ErrorType for FileImage {
        type Error = ErrorKind;
    }

    impl embedded_io::Read for FileImage {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, ErrorKind> {
            loop {
                match std::io::Read::read(&mut self.0, buf) {
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                    result => return result.map_err(|e| e.kind().into()),
                }
            }
        }
    }

    fn image_error(e: &std::io::Error) -> ImageError {
        ImageError::Io(e.kind().into())
    }

    #[cfg(test)]
    mod tests {
        use std::io;

        use super::*;

        #[test]
        fn io_errors_keep_their_kind() {
            let err = |kind| image_error(&io::Error::from(kind));
            assert_eq!(err(io::ErrorKind::NotFound), ImageError::Io(ErrorKind::NotFound));
            assert_eq!(
                err(io::ErrorKind::PermissionDenied),
                ImageError::Io(ErrorKind::PermissionDenied)
            );
            assert_eq!(err(io::ErrorKind::InvalidData), ImageError::Io(ErrorKind::InvalidData));
            assert_ne!(err(io::ErrorKind::UnexpectedEof), ImageError::Io(ErrorKind::TimedOut));
        }

        #[test]
        fn missing_image_is_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = FirmwareDir::new(dir.path());
            assert!(matches!(
                store.open(FirmwareArtifact::Patch),
                Err(ImageError::Io(ErrorKind::NotFound))
            ));
        }
    }
}

impl<T: Transport> Si46xx<T> {
    /// Stream an image of `len` bytes to the bootloader
    pub fn load_image<R: Read>(&mut self, source: &mut R, len: usize) -> Result<LoadSummary, T::Error> {
        load_image(&mut self.bus, source, len)
    }

    /// Load an image held in memory
    pub fn load_image_from_slice(&mut self, image: &[u8]) -> Result<LoadSummary, T::Error> {
        let mut source = image;
        load_image(&mut self.bus, &mut source, image.len())
    }

    /// Open `artifact` in `store` and load it
    pub fn load_artifact<S: FirmwareStore>(
        &mut self,
        store: &mut S,
        artifact: FirmwareArtifact,
    ) -> Result<LoadSummary, T::Error> {
        let (mut source, len) = store.open(artifact)?;
        info!("loading {} ({} bytes)", artifact, len);
        load_image(&mut self.bus, &mut source, len)
    }

    /// Load an image file from the host file system
    #[cfg(feature = "std")]
    pub fn load_image_from_file(&mut self, path: impl AsRef<std::path::Path>) -> Result<LoadSummary, T::Error> {
        let (mut source, len) = FileImage::open(path)?;
        load_image(&mut self.bus, &mut source, len)
    }
}
