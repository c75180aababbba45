//! Bounded busy waiting.
//!
//! Every foreground wait in the firmware is a spin loop whose exit depends
//! on an interrupt firing. A [`Budget`] makes the ceiling of such a loop
//! explicit so a target that never answers ends in an error instead of a
//! livelock.

/// A bounded wait ran out of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stalled;

/// Remaining iterations of one busy wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    remaining: Option<u32>,
}

impl Budget {
    /// `None` never runs out.
    pub const fn new(limit: Option<u32>) -> Self {
        Self { remaining: limit }
    }

    pub const fn unbounded() -> Self {
        Self { remaining: None }
    }

    /// Spend one iteration.
    #[inline]
    pub fn tick(&mut self) -> Result<(), Stalled> {
        match self.remaining.as_mut() {
            None => Ok(()),
            Some(0) => Err(Stalled),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
        }
    }
}
