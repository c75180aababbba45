//! `V`: compare a hex stream against target flash.
//!
//! Checksums are not checked here. Every data byte is compared against a
//! streamed page read, which is re-opened whenever the address crosses a
//! page.

use embedded_hal::blocking::delay::DelayUs;

use super::page::PageCursor;
use super::record::{RecordDecoder, RecordKind, Step};
use super::Outcome;
use crate::config::{status, CANCEL};
use crate::drivers::{HostLink, Target};
use crate::error::Result;
use crate::hal::{DevicePort, HostPort};

pub struct Verifier {
    decoder: RecordDecoder,
    header: u16,
    cursor: PageCursor,
    reading: bool,
    record_mismatch: bool,
    mismatched: bool,
}

impl Verifier {
    pub fn new() -> Self {
        Self {
            decoder: RecordDecoder::new(false),
            header: 0,
            cursor: PageCursor::default(),
            reading: false,
            record_mismatch: false,
            mismatched: false,
        }
    }

    /// Any byte compared so far differed.
    pub fn mismatched(&self) -> bool {
        self.mismatched
    }

    /// Handle one character from the host. Returns `true` once the end record
    /// has been seen.
    pub fn feed<H, P, D>(
        &mut self,
        c: u8,
        host: &mut HostLink<'_, H>,
        target: &mut Target<'_, P, D>,
    ) -> Result<bool>
    where
        H: HostPort,
        P: DevicePort,
        D: DelayUs<u8>,
    {
        match self.decoder.feed(c) {
            Step::Pending | Step::Kind(_) => {}
            Step::Address(address) => self.header = address,
            Step::Data(expected) => {
                if self.decoder.kind() != Some(RecordKind::Data) {
                    return Ok(false);
                }
                if !self.reading {
                    self.cursor = PageCursor::begin(self.header);
                    host.pause();
                    target.begin_read(self.header)?;
                    host.resume();
                    self.reading = true;
                }
                let actual = target.read_next()?;
                if actual != expected {
                    log::debug!(
                        "mismatch at {:#06x}: expected {:#04x}, read {:#04x}",
                        self.cursor.address(),
                        expected,
                        actual
                    );
                    self.record_mismatch = true;
                    self.mismatched = true;
                }
                if self.cursor.advance(self.decoder.bytes().len()).is_some() {
                    host.pause();
                    target.end_read()?;
                    target.begin_read(self.cursor.address())?;
                    host.resume();
                }
            }
            Step::Complete(_) => {
                self.close(target)?;
                let mark = if self.record_mismatch {
                    status::MISMATCH
                } else {
                    status::OK
                };
                self.record_mismatch = false;
                host.write_byte(mark);
                return Ok(self.decoder.kind() == Some(RecordKind::End));
            }
            Step::OddDigits => {
                self.close(target)?;
                self.record_mismatch = false;
                host.write_byte(status::ODD_DIGITS);
            }
        }
        Ok(false)
    }

    fn close<P, D>(&mut self, target: &mut Target<'_, P, D>) -> Result<()>
    where
        P: DevicePort,
        D: DelayUs<u8>,
    {
        if self.reading {
            self.reading = false;
            target.end_read()?;
        }
        Ok(())
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the verify command until the end record or cancel.
pub fn verify<H, P, D>(
    host: &mut HostLink<'_, H>,
    target: &mut Target<'_, P, D>,
) -> Result<Outcome>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
{
    log::info!("verify started");
    let mut verifier = Verifier::new();
    loop {
        let c = host.read_byte();
        if c == CANCEL {
            return Ok(Outcome::Cancelled);
        }
        if verifier.feed(c, host, target)? {
            break;
        }
    }
    host.read_byte();
    if verifier.mismatched() {
        log::warn!("verify failed");
        host.write_str("\r\nVERIFYING FAILED\r\n");
    } else {
        host.write_str("\r\nVERIFYING DONE\r\n");
    }
    Ok(Outcome::Finished)
}
