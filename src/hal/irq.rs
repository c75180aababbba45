//! State shared between one interrupt handler and the foreground loop.
//!
//! The only synchronization in the firmware is masking the one interrupt
//! source that can touch a given piece of state. [`IrqCell`] ties a value to
//! that source: foreground code reaches it through [`IrqCell::lock`], which
//! masks the source for the duration of the closure, and the handler reaches
//! it through [`IrqCell::isr`].

use core::cell::RefCell;

/// Interrupt sources that guard shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Irq {
    /// Host serial transmitter ready
    HostTx,
    /// Host serial byte received
    HostRx,
    /// Device link transfer complete
    Device,
}

/// Per-source interrupt enable control.
pub trait IrqControl {
    fn disable(&mut self, irq: Irq);
    fn enable(&mut self, irq: Irq);
}

pub struct IrqCell<T> {
    irq: Irq,
    value: RefCell<T>,
}

// Single core: the handler for `irq` and the foreground are the only
// contexts, and `lock` keeps the handler out while it holds the borrow.
#[cfg(target_arch = "avr")]
unsafe impl<T: Send> Sync for IrqCell<T> {}

impl<T> IrqCell<T> {
    pub const fn new(irq: Irq, value: T) -> Self {
        Self {
            irq,
            value: RefCell::new(value),
        }
    }

    pub fn irq(&self) -> Irq {
        self.irq
    }

    /// Foreground access with the guarding interrupt masked.
    ///
    /// The closure also receives the controller, so hardware that must be
    /// touched atomically with the state (starting a transfer) can be.
    pub fn lock<C, R>(&self, ctl: &mut C, f: impl FnOnce(&mut T, &mut C) -> R) -> R
    where
        C: IrqControl,
    {
        ctl.disable(self.irq);
        let result = {
            let mut value = self.value.borrow_mut();
            f(&mut value, ctl)
        };
        ctl.enable(self.irq);
        result
    }

    /// Access from the guarding interrupt handler.
    ///
    /// Panics if foreground code holds the value, which means the source
    /// was not masked.
    pub fn isr<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.borrow_mut())
    }
}
