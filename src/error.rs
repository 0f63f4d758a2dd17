//! Error taxonomy shared by every buffer kind in this crate.

use core::fmt;

/// Errors returned by the dual-mode buffer, the blocking stream, and the
/// command-history ring.
///
/// Unlike the C source this was distilled from, operations here never use a
/// side-channel `errno`; the failure mode is always carried in the `Err` arm
/// of a `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An argument was out of its declared range: a size bound, a
    /// descriptor outside `[0, max)`, both read and write modes requested
    /// of an operation that only accepts one, or an operation that is not
    /// legal in circular mode (seek, tell, compact).
    Invalid,
    /// No free slot was available in an open-buffer table, or a requested
    /// allocation could not be satisfied.
    Resource,
    /// The buffer was empty on read, or full on write under a policy that
    /// does not block or truncate.
    EndOfStream,
    /// A non-blocking operation could not complete immediately; the
    /// operation's return value (if any) reflects how much was actually
    /// transferred.
    Congestion,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Invalid => "invalid argument",
            Self::Resource => "no free slot or allocation refused",
            Self::EndOfStream => "end of stream",
            Self::Congestion => "operation would block",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;
