//! Streamed hex record decoder.
//!
//! A record arrives as ASCII hex digits `[count][addr_hi][addr_lo][type]
//! [payload...][checksum]`, one character at a time, with no way to look
//! back. The decoder folds case, drops anything that is not a hex digit and
//! reports what each completed byte means:
//!
//! | state             | byte completed                | next state        | step          |
//! |-------------------|-------------------------------|-------------------|---------------|
//! | `AwaitingHeader`  | 1st, 2nd                      | `AwaitingHeader`  | `Pending`     |
//! | `AwaitingHeader`  | 3rd                           | `AwaitingHeader`  | `Address`     |
//! | `AwaitingHeader`  | 4th                           | `AwaitingPayload` | `Kind`        |
//! | `AwaitingPayload` | before `count + 5`            | `AwaitingPayload` | `Data`        |
//! | `AwaitingPayload` | `count + 5`th (checksum)      | `RecordComplete`  | `Complete`    |
//! | any               | CR/LF with half a byte held   | `AwaitingHeader`  | `OddDigits`   |
//!
//! The next character after `RecordComplete` starts a fresh record.

use heapless::Vec;

use crate::config::{CARRIAGE_RETURN, LINE_FEED, RECORD_CAPACITY};

/// Count, address and type bytes
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    End,
    Other(u8),
}

impl From<u8> for RecordKind {
    fn from(value: u8) -> Self {
        match value {
            0 => RecordKind::Data,
            1 => RecordKind::End,
            other => RecordKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingHeader,
    AwaitingPayload,
    RecordComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted(RecordKind),
    BadChecksum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Ignored character, or the high nibble of a byte
    Pending,
    /// Count and address are in
    Address(u16),
    /// Record type is in
    Kind(RecordKind),
    /// One payload byte
    Data(u8),
    /// Checksum byte is in
    Complete(Verdict),
    /// A line ended halfway through a byte; the record was dropped
    OddDigits,
}

pub struct RecordDecoder {
    bytes: Vec<u8, RECORD_CAPACITY>,
    high: Option<u8>,
    sum: u8,
    checksummed: bool,
}

impl RecordDecoder {
    /// `checksummed` decoders reject records whose bytes do not sum to zero.
    pub const fn new(checksummed: bool) -> Self {
        Self {
            bytes: Vec::new(),
            high: None,
            sum: 0,
            checksummed,
        }
    }

    pub fn state(&self) -> State {
        match self.bytes.len() {
            n if n < HEADER_LEN => State::AwaitingHeader,
            n if n < self.record_len() => State::AwaitingPayload,
            _ => State::RecordComplete,
        }
    }

    /// Bytes of the current record so far, header included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> Option<RecordKind> {
        self.bytes.get(3).map(|&t| RecordKind::from(t))
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
        self.high = None;
        self.sum = 0;
    }

    pub fn feed(&mut self, c: u8) -> Step {
        if self.state() == State::RecordComplete {
            self.reset();
        }

        let nibble = match c {
            b'0'..=b'9' => c - b'0',
            b'A'..=b'F' => c - b'A' + 10,
            b'a'..=b'f' => c - b'a' + 10,
            CARRIAGE_RETURN | LINE_FEED if self.high.is_some() => {
                self.reset();
                return Step::OddDigits;
            }
            _ => return Step::Pending,
        };

        let Some(high) = self.high.take() else {
            self.high = Some(nibble);
            return Step::Pending;
        };
        let byte = (high << 4) | nibble;

        // The count field caps a record at RECORD_CAPACITY bytes.
        if self.bytes.push(byte).is_err() {
            self.reset();
            return Step::Pending;
        }
        if self.checksummed {
            self.sum = self.sum.wrapping_add(byte);
        }

        match self.bytes.len() {
            1 | 2 => Step::Pending,
            3 => Step::Address(u16::from_be_bytes([self.bytes[1], self.bytes[2]])),
            HEADER_LEN => Step::Kind(RecordKind::from(byte)),
            n if n == self.record_len() => Step::Complete(self.verdict()),
            _ => Step::Data(byte),
        }
    }

    fn record_len(&self) -> usize {
        self.bytes.first().map_or(usize::MAX, |&count| count as usize + 5)
    }

    fn verdict(&self) -> Verdict {
        if self.checksummed && self.sum != 0 {
            return Verdict::BadChecksum;
        }
        Verdict::Accepted(self.kind().unwrap_or(RecordKind::Data))
    }
}
