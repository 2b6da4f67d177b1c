//! Chip-select framing of commands and replies
//!
//! A command is one chip-select period carrying the opcode and its
//! arguments. The reply is fetched in a second period: chip-select is held
//! high long enough for the chip to prepare, then a zero turnaround byte is
//! clocked out and the reply clocked in. There is no ready line, so the
//! settle delay is the only synchronization.

use heapless::Vec;

use crate::config::{
    DYNAMIC_HEADER_LEN, DYNAMIC_READ_CEILING, HOST_LOAD_PAD, MAX_DYNAMIC_REPLY, MAX_TRANSFER_LEN,
    SETTLE_DELAY_MS,
};
use crate::error::{ArgumentError, Error, Result};
use crate::hal::transport::{PinLevel, Transport};
use crate::protocol::command::Command;
use crate::types::HexDump;

/// Raw dynamic-length reply: 6-byte header followed by the announced payload
pub type DynamicReply = Vec<u8, MAX_DYNAMIC_REPLY>;

/// Command/reply framing over a [`Transport`]
pub struct FrameBus<T> {
    transport: T,
}

impl<T: Transport> FrameBus<T> {
    /// Wrap a transport
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrow the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport
    pub fn release(self) -> T {
        self.transport
    }

    /// Send a command frame: opcode followed by `args`
    pub fn write_command(&mut self, command: Command, args: &[u8]) -> Result<(), T::Error> {
        check_frame_len(1 + args.len())?;
        trace!("-> {} {}", command, HexDump(args));

        let opcode = [command.opcode()];
        self.framed(|t| {
            t.write(&opcode)?;
            t.write(args)
        })
    }

    /// Send one piece of a firmware image behind the 3-byte zero pad
    pub fn write_host_load_chunk(&mut self, command: Command, chunk: &[u8]) -> Result<(), T::Error> {
        check_frame_len(1 + HOST_LOAD_PAD + chunk.len())?;

        let opcode = [command.opcode()];
        self.framed(|t| {
            t.write(&opcode)?;
            t.write(&[0; HOST_LOAD_PAD])?;
            t.write(chunk)
        })
    }

    /// Read a fixed-length reply, status bytes included
    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], T::Error> {
        let mut reply = [0u8; N];

        self.begin_read()?;
        let result = self.transport.transfer_in_place(&mut reply);
        self.end_read(result)?;

        debug!("<- {}", HexDump(&reply));
        Ok(reply)
    }

    /// Read a reply whose length is announced in bytes 4..6 of its header
    ///
    /// Announced lengths above the ceiling are treated as corrupt and read as
    /// zero, leaving just the header.
    pub fn read_dynamic(&mut self) -> Result<DynamicReply, T::Error> {
        let mut header = [0u8; DYNAMIC_HEADER_LEN];
        let mut reply = DynamicReply::new();

        self.begin_read()?;
        let result = self.transport.transfer_in_place(&mut header).and_then(|()| {
            let mut count = usize::from(u16::from_le_bytes([header[4], header[5]]));
            if count > DYNAMIC_READ_CEILING {
                warn!("dynamic reply length {} exceeds ceiling, ignoring payload", count);
                count = 0;
            }
            // Header plus at most the ceiling always fits
            let _ = reply.extend_from_slice(&header);
            if count == 0 {
                return Ok(());
            }
            let _ = reply.resize(DYNAMIC_HEADER_LEN + count, 0);
            self.transport.transfer_in_place(&mut reply[DYNAMIC_HEADER_LEN..])
        });
        self.end_read(result)?;

        debug!("<- {} bytes: {}", reply.len(), HexDump(&reply));
        Ok(reply)
    }

    /// Send a command and read its fixed-length reply
    pub fn command<const N: usize>(&mut self, command: Command, args: &[u8]) -> Result<[u8; N], T::Error> {
        self.write_command(command, args)?;
        self.read_fixed()
    }

    /// Block for `ms` milliseconds
    pub fn delay_ms(&mut self, ms: u32) {
        self.transport.delay_ms(ms);
    }

    /// Drive the reset line
    pub fn set_reset(&mut self, level: PinLevel) -> Result<(), T::Error> {
        self.transport.set_reset(level).map_err(Error::Transport)
    }

    /// Run `body` inside one chip-select period
    ///
    /// Chip-select is released even when `body` fails; the first error wins.
    fn framed<F>(&mut self, body: F) -> Result<(), T::Error>
    where
        F: FnOnce(&mut T) -> core::result::Result<(), T::Error>,
    {
        self.transport.select().map_err(Error::Transport)?;
        let result = body(&mut self.transport);
        self.end_frame(result)
    }

    /// Hold chip-select high to let the chip prepare, then start the reply
    fn begin_read(&mut self) -> Result<(), T::Error> {
        self.transport.deselect().map_err(Error::Transport)?;
        self.transport.delay_ms(SETTLE_DELAY_MS);
        self.transport.select().map_err(Error::Transport)?;

        let result = self.transport.write(&[0]);
        if let Err(e) = result {
            let _ = self.transport.deselect();
            return Err(Error::Transport(e));
        }
        Ok(())
    }

    fn end_read(&mut self, result: core::result::Result<(), T::Error>) -> Result<(), T::Error> {
        self.end_frame(result)?;
        self.transport.delay_ms(SETTLE_DELAY_MS);
        Ok(())
    }

    fn end_frame(&mut self, result: core::result::Result<(), T::Error>) -> Result<(), T::Error> {
        let released = self.transport.deselect();
        result.map_err(Error::Transport)?;
        released.map_err(Error::Transport)
    }
}

fn check_frame_len<E>(len: usize) -> Result<(), E> {
    if len > MAX_TRANSFER_LEN {
        return Err(ArgumentError::FrameTooLong {
            len,
            max: MAX_TRANSFER_LEN,
        }
        .into());
    }
    Ok(())
}
