//! Link and device errors that halt the running command.
//!
//! Protocol-level problems (bad checksum, odd digit count, bad fuse flag,
//! unknown command) are reported inline as status output and are not
//! represented here.

use core::fmt;

use crate::hal::spin::Stalled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A frame was opened while select was still asserted
    StartWhileSelected,
    /// A byte was sent while a deferred deselect was still pending
    BufferNotEmpty,
    /// A byte was sent with select released
    NotSelected,
    /// A record completed before the previous page write released the link
    LinkOverflow,
    /// A bounded wait on the target ran out
    Unresponsive,
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Diagnostic line shown to the operator.
    pub const fn message(&self) -> &'static str {
        match self {
            Error::StartWhileSelected => "SPI START ERROR.",
            Error::BufferNotEmpty => "BUFFER NOT EMPTY.",
            Error::NotSelected => "SS NOT LOW.",
            Error::LinkOverflow => "SPI BUFFER OVERFLOW. REDUCE BAUD RATE.",
            Error::Unresponsive => "DEVICE NOT RESPONDING.",
        }
    }
}

impl From<Stalled> for Error {
    fn from(_: Stalled) -> Self {
        Error::Unresponsive
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl ufmt::uDisplay for Error {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.message())
    }
}
