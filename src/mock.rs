//! Recording transport for host tests
//!
//! [`MockTransport`] logs every bus operation as a [`BusEvent`] and answers
//! reads from a queue of canned replies. One queued reply is consumed per
//! chip-select period that reads; consecutive transfers in that period
//! continue through the same reply, and bytes past its end read as zero.
//! With nothing queued every read returns zeros, which the driver treats as
//! an idle chip.

use std::collections::VecDeque;
use std::fmt;

use crate::hal::transport::{PinLevel, Transport};

/// One recorded bus operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip-select asserted
    Select,
    /// Chip-select released
    Deselect,
    /// Bytes written
    Write(Vec<u8>),
    /// Bytes returned by a transfer
    Read(Vec<u8>),
    /// Delay in milliseconds
    Delay(u32),
    /// Reset line driven
    Reset(PinLevel),
}

/// Bytes exchanged in one chip-select period
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Everything written, in order
    pub written: Vec<u8>,
    /// Everything returned by transfers, in order
    pub read: Vec<u8>,
}

impl Frame {
    /// Check if the period clocked in any reply bytes
    #[must_use]
    pub fn is_read(&self) -> bool {
        !self.read.is_empty()
    }
}

/// Error injected by [`MockTransport::fail_after`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("injected bus failure")
    }
}

impl std::error::Error for MockError {}

/// In-memory [`Transport`] that records traffic
#[derive(Debug, Default)]
pub struct MockTransport {
    events: Vec<BusEvent>,
    replies: VecDeque<Vec<u8>>,
    current: Option<(Vec<u8>, usize)>,
    fail_after: Option<usize>,
}

impl MockTransport {
    /// Create an idle transport with no queued replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the raw bytes returned by the next reading chip-select period
    pub fn queue_reply(&mut self, reply: &[u8]) {
        self.replies.push_back(reply.to_vec());
    }

    /// Queue several replies in order
    pub fn queue_replies<'a>(&mut self, replies: impl IntoIterator<Item = &'a [u8]>) {
        for reply in replies {
            self.queue_reply(reply);
        }
    }

    /// Replies not yet consumed
    #[must_use]
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Fail every write and transfer after `ops` more have succeeded
    pub fn fail_after(&mut self, ops: usize) {
        self.fail_after = Some(ops);
    }

    /// All recorded events
    #[must_use]
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget recorded events, keeping queued replies
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Recorded chip-select periods
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut open: Option<Frame> = None;

        for event in &self.events {
            match event {
                BusEvent::Select => open = Some(Frame::default()),
                BusEvent::Deselect => {
                    if let Some(frame) = open.take() {
                        frames.push(frame);
                    }
                }
                BusEvent::Write(bytes) => {
                    if let Some(frame) = open.as_mut() {
                        frame.written.extend_from_slice(bytes);
                    }
                }
                BusEvent::Read(bytes) => {
                    if let Some(frame) = open.as_mut() {
                        frame.read.extend_from_slice(bytes);
                    }
                }
                BusEvent::Delay(_) | BusEvent::Reset(_) => {}
            }
        }
        frames
    }

    /// Bytes written by periods that read nothing, i.e. command frames
    #[must_use]
    pub fn commands(&self) -> Vec<Vec<u8>> {
        self.frames()
            .into_iter()
            .filter(|f| !f.is_read())
            .map(|f| f.written)
            .collect()
    }

    /// Opcodes of the command frames, in order
    #[must_use]
    pub fn opcodes(&self) -> Vec<u8> {
        self.commands()
            .iter()
            .filter_map(|c| c.first().copied())
            .collect()
    }

    /// Sum of all recorded delays
    #[must_use]
    pub fn total_delay_ms(&self) -> u64 {
        self.events
            .iter()
            .map(|e| match e {
                BusEvent::Delay(ms) => u64::from(*ms),
                _ => 0,
            })
            .sum()
    }

    fn check_fail(&mut self) -> Result<(), MockError> {
        match self.fail_after {
            Some(0) => Err(MockError),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Transport for MockTransport {
    type Error = MockError;

    fn select(&mut self) -> Result<(), MockError> {
        self.current = None;
        self.events.push(BusEvent::Select);
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), MockError> {
        self.current = None;
        self.events.push(BusEvent::Deselect);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), MockError> {
        self.check_fail()?;
        self.events.push(BusEvent::Write(data.to_vec()));
        Ok(())
    }

    fn transfer_in_place(&mut self, buf: &mut [u8]) -> Result<(), MockError> {
        self.check_fail()?;
        let replies = &mut self.replies;
        let (reply, pos) = self
            .current
            .get_or_insert_with(|| (replies.pop_front().unwrap_or_default(), 0));

        for byte in buf.iter_mut() {
            *byte = reply.get(*pos).copied().unwrap_or(0);
            *pos += 1;
        }
        self.events.push(BusEvent::Read(buf.to_vec()));
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.push(BusEvent::Delay(ms));
    }

    fn set_reset(&mut self, level: PinLevel) -> Result<(), MockError> {
        self.events.push(BusEvent::Reset(level));
        Ok(())
    }
}
