//! `L`: program a hex stream into the target.
//!
//! Each record is answered with one status character. Payload is written a
//! page run at a time, with the host held off by XOFF while the frame goes
//! out.

use embedded_hal::blocking::delay::DelayUs;

use super::page::{Flush, PageCursor};
use super::record::{RecordDecoder, RecordKind, Step, Verdict};
use super::Outcome;
use crate::config::{status, CANCEL};
use crate::drivers::{HostLink, Target};
use crate::error::{Error, Result};
use crate::hal::{DevicePort, HostPort};

pub struct Loader {
    decoder: RecordDecoder,
    cursor: PageCursor,
    /// Cursor as it was before the current record moved it
    saved: Option<PageCursor>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            decoder: RecordDecoder::new(true),
            cursor: PageCursor::default(),
            saved: None,
        }
    }

    /// Address the next payload byte would be written to.
    pub fn address(&self) -> u16 {
        self.cursor.address()
    }

    /// Handle one character from the host. Returns `true` once the end record
    /// has been accepted.
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
            Step::Address(address) => {
                self.saved = Some(self.cursor);
                self.cursor = PageCursor::begin(address);
            }
            Step::Data(_) => {
                if self.decoder.kind() != Some(RecordKind::Data) {
                    return Ok(false);
                }
                if let Some(flush) = self.cursor.advance(self.decoder.bytes().len()) {
                    target.poll_busy()?;
                    host.pause();
                    program(self.decoder.bytes(), flush, host, target)?;
                    host.resume();
                }
            }
            Step::Complete(Verdict::Accepted(kind)) => {
                host.write_byte(status::OK);
                host.pause();
                if kind == RecordKind::Data {
                    let end = self.decoder.bytes().len() - 1;
                    if let Some(flush) = self.cursor.finish(end) {
                        if target.is_writing() {
                            return Err(Error::LinkOverflow);
                        }
                        target.poll_busy()?;
                        program(self.decoder.bytes(), flush, host, target)?;
                    }
                }
                self.saved = None;
                host.resume();
                return Ok(kind == RecordKind::End);
            }
            Step::Complete(Verdict::BadChecksum) => {
                log::debug!("checksum mismatch, record dropped");
                host.write_byte(status::BAD_CHECKSUM);
                host.resume();
                self.rewind();
            }
            Step::OddDigits => {
                host.write_byte(status::ODD_DIGITS);
                host.resume();
                self.rewind();
            }
        }
        Ok(false)
    }

    fn rewind(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.cursor = saved;
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn program<H, P, D>(
    record: &[u8],
    flush: Flush,
    host: &mut HostLink<'_, H>,
    target: &mut Target<'_, P, D>,
) -> Result<()>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
{
    target.write_page(flush.address, &record[flush.range])?;
    if target.take_congestion() {
        host.write_byte(status::CONGESTED);
    }
    Ok(())
}

/// Run the load command until the end record or cancel.
pub fn load<H, P, D>(host: &mut HostLink<'_, H>, target: &mut Target<'_, P, D>) -> Result<Outcome>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
{
    log::info!("load started");
    let mut loader = Loader::new();
    let outcome = loop {
        let c = host.read_byte();
        if c == CANCEL {
            break Outcome::Cancelled;
        }
        if loader.feed(c, host, target)? {
            // Line terminator after the end record.
            host.read_byte();
            break Outcome::Finished;
        }
    };
    host.write_str("\r\n");
    log::info!("load {:?}", outcome);
    Ok(outcome)
}
