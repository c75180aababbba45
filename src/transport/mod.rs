//! Interrupt-driven byte transport.
//!
//! Fixed-capacity rings shared between exactly one interrupt handler and one
//! foreground entry point each. Nothing in here touches hardware; the
//! drivers start transfers and the interrupt bodies feed these types.

pub mod channel;
pub mod ring;
pub mod rx;

pub use channel::{Enqueue, TxChannel};
pub use ring::ByteRing;
pub use rx::{RxFaults, RxQueue};
