//! Operator session: bring-up, connection probe and the command line.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;
use heapless::Vec;

use crate::config::{BACKSPACE, CANCEL, CARRIAGE_RETURN, LINE_CAPACITY, RESET_SETTLE_MS};
use crate::drivers::{HostLink, Target, ENABLE_ACK};
use crate::error::{Error, Result};
use crate::hal::{DevicePort, HostPort};
use crate::protocol::{fuses, load, verify, Outcome};

pub const BANNER: &str = "\r\n\nAT89LP6440 PROGRAMMER v0.1\r\n>";
const PROMPT: &str = "\r\n>";
const NO_TARGET: &str = "COULD NOT CONNECT. PRESS ANY KEY TO RECONNECT.\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    EndSession,
}

fn after(outcome: Outcome) -> Flow {
    match outcome {
        Outcome::Finished => Flow::Continue,
        Outcome::Cancelled => Flow::EndSession,
    }
}

pub struct Programmer<'a, H, P, D, R, M> {
    host: HostLink<'a, H>,
    target: Target<'a, P, D>,
    /// Target reset line, high holds the target in reset
    reset: R,
    delay: M,
    line: Vec<u8, LINE_CAPACITY>,
}

impl<'a, H, P, D, R, M> Programmer<'a, H, P, D, R, M>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
    R: OutputPin,
    M: DelayMs<u8>,
{
    pub fn new(host: HostLink<'a, H>, target: Target<'a, P, D>, reset: R, delay: M) -> Self {
        Self {
            host,
            target,
            reset,
            delay,
            line: Vec::new(),
        }
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.run_session();
        }
    }

    /// One session, from reset to cancel. A link error prints its message and
    /// waits for cancel before returning.
    pub fn run_session(&mut self) {
        if let Err(error) = self.session() {
            log::error!("session halted: {}", error);
            self.halt(error);
        }
    }

    pub fn host(&mut self) -> &mut HostLink<'a, H> {
        &mut self.host
    }

    pub fn target(&mut self) -> &mut Target<'a, P, D> {
        &mut self.target
    }

    fn session(&mut self) -> Result<()> {
        self.bring_up();
        self.connect()?;
        loop {
            let key = self.host.read_byte();
            if self.on_key(key)? == Flow::EndSession {
                log::info!("session ended");
                return Ok(());
            }
        }
    }

    fn bring_up(&mut self) {
        self.host.flush();
        self.host.reset();
        self.target.reset_link();
        self.line.clear();
        self.target.attach();

        // Pin errors are infallible on this board.
        self.delay.delay_ms(RESET_SETTLE_MS);
        self.reset.set_high().ok();
        self.delay.delay_ms(RESET_SETTLE_MS);
        self.reset.set_low().ok();
        self.delay.delay_ms(RESET_SETTLE_MS);

        self.host.write_str(BANNER);
        self.host.resume();
    }

    fn connect(&mut self) -> Result<()> {
        loop {
            let ack = self.target.enable()?;
            if ack == ENABLE_ACK {
                log::info!("target connected");
                return Ok(());
            }
            log::warn!("no answer to program enable ({:#04x})", ack);
            self.host.write_str(NO_TARGET);
            self.host.read_byte();
        }
    }

    fn on_key(&mut self, key: u8) -> Result<Flow> {
        match key {
            CANCEL => Ok(Flow::EndSession),
            CARRIAGE_RETURN if self.line.is_empty() => {
                self.host.write_str(PROMPT);
                Ok(Flow::Continue)
            }
            CARRIAGE_RETURN => {
                self.host.write_str("\r\n");
                let flow = self.dispatch()?;
                if flow == Flow::Continue {
                    self.host.write_str(PROMPT);
                    self.line.clear();
                }
                Ok(flow)
            }
            BACKSPACE => {
                if self.line.pop().is_some() {
                    self.host.write_byte(BACKSPACE);
                    self.host.write_byte(b' ');
                    self.host.write_byte(BACKSPACE);
                }
                Ok(Flow::Continue)
            }
            _ => {
                let key = key.to_ascii_uppercase();
                if key.is_ascii_alphanumeric() && self.line.push(key).is_ok() {
                    self.host.write_byte(key);
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn dispatch(&mut self) -> Result<Flow> {
        let line = self.line.clone();
        log::debug!("command {:?}", core::str::from_utf8(&line).unwrap_or("?"));
        match line.as_slice() {
            b"E" => self.target.erase()?,
            b"L" => return Ok(after(load(&mut self.host, &mut self.target)?)),
            b"V" => return Ok(after(verify(&mut self.host, &mut self.target)?)),
            b"R" => {
                self.target.release();
                self.reset.set_high().ok();
            }
            b"S" => {
                self.target.attach();
                self.reset.set_low().ok();
                return Ok(Flow::EndSession);
            }
            b"C" => fuses::show(&mut self.host, &mut self.target)?,
            [b'F', flags @ ..] => fuses::write(&mut self.host, &mut self.target, flags)?,
            _ => self.host.write_str("UNKNOWN COMMAND"),
        }
        Ok(Flow::Continue)
    }

    fn halt(&mut self, error: Error) {
        ufmt::uwrite!(&mut self.host, "\r\n{}\r\n", error).ok();
        // The failed command may have left the host held off.
        self.host.resume();
        self.host.wait_for(CANCEL);
    }
}
