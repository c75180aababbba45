//! Page-boundary bookkeeping for streamed records.
//!
//! Payload is programmed in runs that never straddle a flash page, so a
//! record only has to be held until its bytes reach the next boundary.

use core::ops::Range;

use super::record::HEADER_LEN;
use crate::config::PAGE_SIZE;

/// Record bytes `range` go to flash at `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub address: u16,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageCursor {
    /// Address of the next payload byte
    address: u16,
    /// Address of the first byte not yet flushed
    start: u16,
    /// Record offset of the first byte not yet flushed
    offset: usize,
}

impl PageCursor {
    /// Cursor for a record whose payload starts at `address`.
    pub fn begin(address: u16) -> Self {
        Self {
            address,
            start: address,
            offset: HEADER_LEN,
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Account for the payload byte just stored; `len` is the record length
    /// including it. Returns the run to flush when that byte closed a page.
    pub fn advance(&mut self, len: usize) -> Option<Flush> {
        self.address = self.address.wrapping_add(1);
        if self.address % PAGE_SIZE != 0 {
            return None;
        }
        let flush = Flush {
            address: self.start,
            range: self.offset..len,
        };
        self.start = self.address;
        self.offset = len;
        Some(flush)
    }

    /// Whatever is left once the record ends at `end` (checksum excluded).
    pub fn finish(&mut self, end: usize) -> Option<Flush> {
        if self.offset >= end {
            return None;
        }
        let flush = Flush {
            address: self.start,
            range: self.offset..end,
        };
        self.start = self.address;
        self.offset = end;
        Some(flush)
    }
}
