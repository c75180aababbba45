//! Operator commands that stream hex records or touch the fuses.

pub mod fuses;
pub mod load;
pub mod page;
pub mod record;
pub mod verify;

pub use load::{load, Loader};
pub use page::{Flush, PageCursor};
pub use record::{RecordDecoder, RecordKind, State, Step, Verdict};
pub use verify::{verify, Verifier};

/// How a streaming command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The end record arrived
    Finished,
    /// The operator sent cancel; the session should end
    Cancelled,
}
