//! `C` and `F`: show and edit the twelve fuse bytes.

use embedded_hal::blocking::delay::DelayUs;

use crate::config::FUSE_COUNT;
use crate::drivers::{HostLink, Target};
use crate::error::Result;
use crate::hal::{DevicePort, HostPort};

/// What to do with one fuse byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuseFlag {
    /// `1`: program to 0xFF
    Set,
    /// `0`: program to 0x00
    Clear,
    /// `X`: write back what is there
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagError {
    TooMany,
    /// Zero-based index of the first character that is not a flag
    Invalid { position: usize },
}

/// Validate a whole flag string before anything is sent to the target.
/// Fuses past the end of a short string are kept.
pub fn parse_flags(flags: &[u8]) -> core::result::Result<[FuseFlag; FUSE_COUNT], FlagError> {
    if flags.len() > FUSE_COUNT {
        return Err(FlagError::TooMany);
    }
    let mut parsed = [FuseFlag::Keep; FUSE_COUNT];
    for (position, (&flag, slot)) in flags.iter().zip(parsed.iter_mut()).enumerate() {
        *slot = match flag {
            b'1' => FuseFlag::Set,
            b'0' => FuseFlag::Clear,
            b'X' | b'x' => FuseFlag::Keep,
            _ => return Err(FlagError::Invalid { position }),
        };
    }
    Ok(parsed)
}

pub fn resolve(flags: &[FuseFlag; FUSE_COUNT], current: &[u8; FUSE_COUNT]) -> [u8; FUSE_COUNT] {
    let mut fuses = *current;
    for (fuse, flag) in fuses.iter_mut().zip(flags) {
        match flag {
            FuseFlag::Set => *fuse = 0xFF,
            FuseFlag::Clear => *fuse = 0x00,
            FuseFlag::Keep => {}
        }
    }
    fuses
}

/// `C`
pub fn show<H, P, D>(host: &mut HostLink<'_, H>, target: &mut Target<'_, P, D>) -> Result<()>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
{
    let fuses = target.read_fuses()?;
    host.write_str("FUSES: ");
    for fuse in fuses {
        host.write_hex(fuse);
        host.write_byte(b' ');
    }
    host.write_str("\r\n");
    Ok(())
}

/// `F<flags>`
pub fn write<H, P, D>(
    host: &mut HostLink<'_, H>,
    target: &mut Target<'_, P, D>,
    flags: &[u8],
) -> Result<()>
where
    H: HostPort,
    P: DevicePort,
    D: DelayUs<u8>,
{
    let flags = match parse_flags(flags) {
        Ok(flags) => flags,
        Err(FlagError::TooMany) => {
            host.write_str("TOO MANY FUSES. MAX IS 12.");
            return Ok(());
        }
        Err(FlagError::Invalid { position }) => {
            ufmt::uwrite!(host, "VALID FLAGS ARE 1, 0, AND X. BAD FLAG AT {}", position).ok();
            return Ok(());
        }
    };
    let current = target.read_fuses()?;
    let fuses = resolve(&flags, &current);
    log::debug!("fuses {:02x?} -> {:02x?}", current, fuses);
    target.write_fuses(&fuses)?;
    host.write_str("FUSES SET.\r\n");
    Ok(())
}
