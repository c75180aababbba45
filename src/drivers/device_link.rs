//! Framed half-duplex link to the target.
//!
//! Bytes go out through a ring drained by the transfer-complete interrupt.
//! Every byte clocked out clocks one back in; the interrupt keeps only the
//! reply to the last outstanding byte, which is all a caller ever waits for.

use embedded_hal::blocking::delay::DelayUs;

use crate::config::{Limits, DEVICE_TX_CAPACITY, SELECT_SETTLE_US};
use crate::error::{Error, Result};
use crate::hal::{Budget, DevicePort, Irq, IrqCell};
use crate::transport::{Enqueue, TxChannel};

/// Byte clocked out when only the reply matters.
pub const FILLER: u8 = b'Z';

/// Link state shared with the transfer-complete interrupt.
pub struct DeviceState {
    tx: TxChannel<DEVICE_TX_CAPACITY>,
    /// Bytes clocked out whose completion has not been seen yet
    pending: u8,
    /// Reply captured when `pending` reached zero
    reply: u8,
    selected: bool,
    /// Release select from the interrupt once `pending` reaches zero
    deferred_release: bool,
}

impl DeviceState {
    const fn new() -> Self {
        Self {
            tx: TxChannel::new(),
            pending: 0,
            reply: 0,
            selected: false,
            deferred_release: false,
        }
    }

    fn is_quiet(&self) -> bool {
        self.pending == 0 && self.tx.is_idle()
    }
}

/// Hardware actions the interrupt must carry out after a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Load this byte into the shift register
    pub next: Option<u8>,
    /// Drive select inactive
    pub release_select: bool,
}

pub struct DeviceShared {
    state: IrqCell<DeviceState>,
}

impl DeviceShared {
    pub const fn new() -> Self {
        Self {
            state: IrqCell::new(Irq::Device, DeviceState::new()),
        }
    }

    /// Transfer-complete interrupt body.
    pub fn on_transfer_complete(&self, reply: u8) -> Completion {
        self.state.isr(|s| {
            s.pending = s.pending.saturating_sub(1);
            let mut release_select = false;
            if s.pending == 0 {
                s.reply = reply;
                if s.deferred_release {
                    s.deferred_release = false;
                    s.selected = false;
                    release_select = true;
                }
            }
            Completion {
                next: s.tx.on_tx_ready(),
                release_select,
            }
        })
    }
}

impl Default for DeviceShared {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DeviceLink<'a, P, D> {
    port: P,
    delay: D,
    shared: &'a DeviceShared,
    spin_limit: Option<u32>,
    stalled: bool,
}

impl<'a, P, D> DeviceLink<'a, P, D>
where
    P: DevicePort,
    D: DelayUs<u8>,
{
    pub fn new(port: P, delay: D, shared: &'a DeviceShared, limits: Limits) -> Self {
        Self {
            port,
            delay,
            shared,
            spin_limit: limits.link_spin,
            stalled: false,
        }
    }

    /// Forget any transfer in progress and release select.
    pub fn reset(&mut self) {
        self.shared.state.lock(&mut self.port, |s, port| {
            s.tx.reset();
            s.pending = 0;
            s.deferred_release = false;
            s.selected = false;
            port.set_select(false);
        });
        self.stalled = false;
    }

    /// Open a frame.
    pub fn start(&mut self) -> Result<()> {
        let opened = self.shared.state.lock(&mut self.port, |s, port| {
            if s.selected {
                return false;
            }
            s.selected = true;
            port.set_select(true);
            true
        });
        if opened {
            Ok(())
        } else {
            log::warn!("frame opened while select still asserted");
            Err(Error::StartWhileSelected)
        }
    }

    /// Queue a byte without waiting for ring space.
    pub fn try_send(&mut self, byte: u8) -> nb::Result<(), Error> {
        self.shared.state.lock(&mut self.port, |s, port| {
            if s.deferred_release {
                return Err(nb::Error::Other(Error::BufferNotEmpty));
            }
            if !s.selected {
                return Err(nb::Error::Other(Error::NotSelected));
            }
            match s.tx.enqueue(byte) {
                Enqueue::Start(byte) => {
                    port.transmit(byte);
                    s.pending += 1;
                    Ok(())
                }
                Enqueue::Queued => {
                    s.pending += 1;
                    Ok(())
                }
                Enqueue::Full(_) => Err(nb::Error::WouldBlock),
            }
        })
    }

    /// Queue a byte, spinning while the ring is full.
    pub fn send(&mut self, byte: u8) -> Result<()> {
        let mut budget = Budget::new(self.spin_limit);
        loop {
            match self.try_send(byte) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {
                    self.stalled = true;
                    budget.tick()?;
                    self.port.relax();
                }
                Err(nb::Error::Other(e)) => {
                    log::warn!("device send refused: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Clock one filler byte and return what the target shifted back.
    pub fn receive(&mut self) -> Result<u8> {
        self.send(FILLER)?;
        let mut budget = Budget::new(self.spin_limit);
        loop {
            let reply = self
                .shared
                .state
                .lock(&mut self.port, |s, _| (s.pending == 0).then_some(s.reply));
            if let Some(reply) = reply {
                return Ok(reply);
            }
            budget.tick()?;
            self.port.relax();
        }
    }

    /// Wait for the link to drain, then close the frame.
    pub fn stop(&mut self) -> Result<()> {
        let mut budget = Budget::new(self.spin_limit);
        while !self.shared.state.lock(&mut self.port, |s, _| s.is_quiet()) {
            budget.tick()?;
            self.port.relax();
        }
        self.delay.delay_us(SELECT_SETTLE_US);
        self.shared.state.lock(&mut self.port, |s, port| {
            s.deferred_release = false;
            s.selected = false;
            port.set_select(false);
        });
        Ok(())
    }

    /// Close the frame without waiting; the interrupt releases select once
    /// the last reply lands.
    pub fn deferred_stop(&mut self) {
        self.shared.state.lock(&mut self.port, |s, port| {
            if s.pending > 0 {
                s.deferred_release = true;
            } else {
                s.selected = false;
                port.set_select(false);
            }
        });
    }

    /// Select is asserted, either by an open frame or a deferred stop.
    pub fn is_selected(&mut self) -> bool {
        self.shared.state.lock(&mut self.port, |s, _| s.selected)
    }

    /// Returns and clears whether a send had to wait for ring space.
    pub fn take_stalled(&mut self) -> bool {
        core::mem::replace(&mut self.stalled, false)
    }

    pub fn set_attached(&mut self, attached: bool) {
        self.port.set_attached(attached);
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
