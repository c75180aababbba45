//! In-circuit programmer for AT89LP microcontrollers.
//!
//! An operator drives the programmer over a flow-controlled serial line;
//! the programmer talks to the target over SPI. Everything above the
//! [`hal::port`] traits is target independent and runs on the host under test.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod application;
pub mod config;
pub mod drivers;
pub mod error;
pub mod hal;
pub mod protocol;
pub mod transport;

pub use application::Programmer;
pub use error::{Error, Result};
