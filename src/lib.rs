#![no_std]
#![warn(missing_docs)]

//! Dual-mode byte buffers, a blocking circular byte stream, and a
//! command-history ring for embedded and RTOS targets.
//!
//! Four components, in increasing order of how much policy they carry on
//! top of the same cursor-and-used-count core:
//!
//! - [`pool::SizedPool`]: three fixed scratch slabs leased by upper-bound
//!   size, for callers that need a transient buffer without a general
//!   allocator.
//! - [`dual_buffer::DualBuffer`] (plus its open-table façade,
//!   [`dual_buffer::Table`]): a linear-or-circular buffer with seek,
//!   compaction, and line-oriented character I/O.
//! - [`stream::Stream`] (plus its descriptor façade, [`vfs::Table`]): a
//!   bounded FIFO with blocking, non-blocking, and truncate-on-full write
//!   policies.
//! - [`history::HistoryRing`]: a bounded ring of NUL-terminated records
//!   with shell-style previous/next navigation.
//!
//! None of these suspend a caller except [`stream::Stream`]'s blocking
//! write/read paths and [`pool::SizedPool::acquire`], both of which do so
//! through the host-supplied [`scheduler::Scheduler`] rather than any
//! particular RTOS binding.

pub mod dual_buffer;
pub mod error;
pub mod flags;
pub mod history;
pub mod pool;
pub mod report;
pub mod scheduler;
mod sync;
pub mod stream;
pub mod vfs;

pub use error::{Error, Result};
