//! Named flag sets (`SPEC_FULL.md` §9: "union-of-flag-bits becomes a named
//! flag set type").
//!
//! The source keeps buffer mode flags and stream mode flags in separate
//! bitfields (`buf_t::_flags` vs `ubuf_t::_flags`/`f_flags`); this crate keeps
//! that separation as three distinct [`bitflags`] types rather than one
//! flag set shared by unrelated buffer kinds.

use bitflags::bitflags;

bitflags! {
    /// Mode flags for [`crate::dual_buffer::DualBuffer`], set at `open` time
    /// and mostly immutable afterward (`UNGETC` is the only bit a running
    /// buffer flips on itself).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct BufFlags: u16 {
        /// Buffer opened for reading.
        const READ       = 1 << 0;
        /// Buffer opened for writing.
        const WRITE      = 1 << 1;
        /// Buffer opened for both reading and writing.
        const READ_WRITE = 1 << 2;
        /// Writes append rather than overwrite from the current cursor.
        const APPEND     = 1 << 3;
        /// Binary mode: `putc`/`gets` do not treat CR/LF specially.
        const BINARY     = 1 << 4;
        /// Circular mode: indices wrap, seek/tell/compact are disallowed.
        const CIRCULAR   = 1 << 5;
        /// `space()` attempts a compaction before reporting free bytes.
        const PACKING    = 1 << 6;
        /// Backing storage was allocated by `open` and must be freed by `close`.
        const ALLOCATED  = 1 << 7;
        /// The current call originates from interrupt context.
        const IN_ISR     = 1 << 8;
        /// A byte has been ungotten and is pending re-read.
        const UNGETC     = 1 << 9;
    }
}

bitflags! {
    /// Flags supplied to [`crate::stream::Stream::open`] / the VFS façade's
    /// `open`, mirroring the source's `openFlags` on `ubuf_t`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct OpenFlags: u8 {
        /// `read`/`write` never suspend; report [`crate::Error::Congestion`] instead.
        const NON_BLOCK  = 1 << 0;
        /// `write` evicts oldest bytes to make room instead of blocking.
        const TRUNCATE   = 1 << 1;
        /// Open for both reading and writing (direct API ignores this; the
        /// VFS façade keeps it only to mirror the source's `O_RDWR`).
        const READ_WRITE = 1 << 2;
    }
}

bitflags! {
    /// Internal state flags tracked by [`crate::stream::Stream`], mirroring
    /// `ubuf_t`'s `f_*` bitfield.
    ///
    /// The source additionally tracks `f_alloc`/`f_struct` (whether the
    /// backing buffer and control struct were heap-allocated). This crate
    /// always owns its storage through ordinary Rust ownership, so those two
    /// bits have no counterpart here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct FeatureFlags: u8 {
        /// The stream is fully initialized and usable.
        const INIT        = 1 << 0;
        /// Skip the crate-wide critical section; caller asserts single-threaded access.
        const NO_LOCK      = 1 << 1;
        /// A [`OpenFlags::NON_BLOCK`] write was denied space (EAGAIN-equivalent);
        /// cleared by [`crate::stream::Stream::take_error`].
        const STATE_ERROR  = 1 << 3;
    }
}
