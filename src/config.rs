//! Configuration constants for the AT89LP in-circuit programmer

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Host link baud rate
pub const HOST_BAUD: u32 = 57_600;

/// Outbound host ring capacity
pub const HOST_TX_CAPACITY: usize = 64;

/// Inbound host queue capacity
pub const HOST_RX_CAPACITY: usize = 64;

/// Outbound device ring capacity
pub const DEVICE_TX_CAPACITY: usize = 64;

/// Command line length, not counting the terminating CR
pub const LINE_CAPACITY: usize = 50;

/// Largest record: count byte, two address bytes, type, 255 data bytes, checksum
pub const RECORD_CAPACITY: usize = u8::MAX as usize + 5;

/// Flash page size of the target, in bytes
pub const PAGE_SIZE: u16 = 64;

/// Number of fuse bytes on the target
pub const FUSE_COUNT: usize = 12;

/// Software flow control: host must stop sending
pub const XOFF: u8 = 0x13;

/// Software flow control: host may resume sending
pub const XON: u8 = 0x11;

/// Ctrl-C, aborts a line or a streaming command
pub const CANCEL: u8 = 0x03;

pub const BACKSPACE: u8 = 0x08;
pub const CARRIAGE_RETURN: u8 = 0x0D;
pub const LINE_FEED: u8 = 0x0A;

/// Status characters written while streaming records
pub mod status {
    pub const OK: u8 = b'.';
    pub const BAD_CHECKSUM: u8 = b'C';
    pub const ODD_DIGITS: u8 = b'U';
    pub const MISMATCH: u8 = b'x';
    /// Device ring was full and a send had to wait
    pub const CONGESTED: u8 = b'!';
}

/// Settle time between the last clocked byte and releasing select
pub const SELECT_SETTLE_US: u8 = 1;

/// Reset pulse phases during session bring-up
pub const RESET_SETTLE_MS: u8 = 10;

/// Default iteration ceilings for device-side busy waits
pub const DEFAULT_BUSY_POLL_LIMIT: u32 = 100_000;
pub const DEFAULT_LINK_SPIN_LIMIT: u32 = 50_000;

/// Iteration ceilings for every busy wait that depends on the target.
///
/// `None` spins forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Status reads while waiting for the target to finish a write or erase
    pub busy_poll: Option<u32>,
    /// Spins while waiting for a reply, ring space or an idle link
    pub link_spin: Option<u32>,
}

impl Limits {
    pub const fn unbounded() -> Self {
        Self {
            busy_poll: None,
            link_spin: None,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            busy_poll: Some(DEFAULT_BUSY_POLL_LIMIT),
            link_spin: Some(DEFAULT_LINK_SPIN_LIMIT),
        }
    }
}
