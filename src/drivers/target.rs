//! AT89LP serial programming commands.

use core::iter;

use embedded_hal::blocking::delay::DelayUs;

use super::device_link::DeviceLink;
use crate::config::{Limits, FUSE_COUNT};
use crate::error::Result;
use crate::hal::{Budget, DevicePort};

const PREAMBLE: [u8; 2] = [0xAA, 0x55];

const PROGRAM_ENABLE: u8 = 0xAC;
const CHIP_ERASE: u8 = 0x8A;
const READ_STATUS: u8 = 0x60;
const READ_CODE_PAGE: u8 = 0x30;
const WRITE_CODE_PAGE: u8 = 0x50;
const READ_FUSES: u8 = 0x61;
const WRITE_FUSES: u8 = 0xF1;

const ENABLE_KEY: u8 = 0x53;
const STATUS_ARGS: [u8; 2] = *b"XY";
const FUSE_ARGS: [u8; 2] = [0x00, 0x00];

/// Status bit set once the target has finished a write or erase
const STATUS_READY: u8 = 0x01;

/// Reply to program-enable from a target that is listening.
pub const ENABLE_ACK: u8 = 0x53;

pub struct Target<'a, P, D> {
    link: DeviceLink<'a, P, D>,
    busy_poll_limit: Option<u32>,
}

impl<'a, P, D> Target<'a, P, D>
where
    P: DevicePort,
    D: DelayUs<u8>,
{
    pub fn new(link: DeviceLink<'a, P, D>, limits: Limits) -> Self {
        Self {
            link,
            busy_poll_limit: limits.busy_poll,
        }
    }

    /// Enter programming mode and return the acknowledgment byte.
    ///
    /// Anything other than [`ENABLE_ACK`] means nobody answered; that is for
    /// the caller to judge.
    pub fn enable(&mut self) -> Result<u8> {
        self.open(PROGRAM_ENABLE, &[ENABLE_KEY])?;
        let ack = self.link.receive()?;
        self.link.stop()?;
        log::debug!("program enable answered {:#04x}", ack);
        Ok(ack)
    }

    pub fn erase(&mut self) -> Result<()> {
        log::info!("chip erase");
        self.open(CHIP_ERASE, &[])?;
        self.link.stop()?;
        self.poll_busy()
    }

    /// Read status until the ready bit is set.
    pub fn poll_busy(&mut self) -> Result<()> {
        self.open(READ_STATUS, &STATUS_ARGS)?;
        let mut budget = Budget::new(self.busy_poll_limit);
        let mut reads = 0u32;
        loop {
            let status = self.link.receive()?;
            reads += 1;
            if status & STATUS_READY != 0 {
                break;
            }
            budget.tick()?;
        }
        log::trace!("target ready after {} status reads", reads);
        self.link.stop()
    }

    /// Frame a page write and leave the tail to drain in the background.
    pub fn write_page(&mut self, address: u16, data: &[u8]) -> Result<()> {
        log::debug!("page write {:#06x}, {} bytes", address, data.len());
        self.open(WRITE_CODE_PAGE, &address.to_be_bytes())?;
        for &byte in data {
            self.link.send(byte)?;
        }
        self.link.deferred_stop();
        Ok(())
    }

    /// Open a read frame; bytes then stream back one per [`Self::read_next`].
    pub fn begin_read(&mut self, address: u16) -> Result<()> {
        log::trace!("page read {:#06x}", address);
        self.open(READ_CODE_PAGE, &address.to_be_bytes())
    }

    pub fn read_next(&mut self) -> Result<u8> {
        self.link.receive()
    }

    pub fn end_read(&mut self) -> Result<()> {
        self.link.stop()
    }

    pub fn read_fuses(&mut self) -> Result<[u8; FUSE_COUNT]> {
        self.open(READ_FUSES, &FUSE_ARGS)?;
        let mut fuses = [0u8; FUSE_COUNT];
        for fuse in fuses.iter_mut() {
            *fuse = self.link.receive()?;
        }
        self.link.stop()?;
        Ok(fuses)
    }

    pub fn write_fuses(&mut self, fuses: &[u8; FUSE_COUNT]) -> Result<()> {
        log::info!("writing fuses");
        self.open(WRITE_FUSES, &FUSE_ARGS)?;
        for &fuse in fuses {
            self.link.send(fuse)?;
        }
        self.link.stop()
    }

    /// A previous page write still holds select.
    pub fn is_writing(&mut self) -> bool {
        self.link.is_selected()
    }

    /// Returns and clears whether the last frames had to wait for ring space.
    pub fn take_congestion(&mut self) -> bool {
        self.link.take_stalled()
    }

    /// Float the link pins so the target can run.
    pub fn release(&mut self) {
        self.link.set_attached(false);
    }

    pub fn attach(&mut self) {
        self.link.set_attached(true);
    }

    pub fn reset_link(&mut self) {
        self.link.reset();
    }

    fn open(&mut self, opcode: u8, args: &[u8]) -> Result<()> {
        self.link.start()?;
        for &byte in PREAMBLE.iter().chain(iter::once(&opcode)).chain(args) {
            self.link.send(byte)?;
        }
        Ok(())
    }
}
