//! File-descriptor façade over at most 3 simultaneously open [`Stream`]s.
//!
//! Grounded on `x_ubuf.c`'s VFS section (`_xUBufOpen`/`_xUBufClose`/
//! `_xUBufRead`/`_xUBufWrite`/`_xUBufIoctl`, registered at `/ubuf` via
//! `esp_vfs_t`). The out-of-scope VFS registration itself (§1, Non-goals)
//! becomes the [`MountRegistry`] trait; this module keeps only the
//! descriptor-table bookkeeping the source's `esp_vfs_t` callbacks wrap.

use crate::error::{Error, Result};
use crate::flags::OpenFlags;
use crate::scheduler::Scheduler;
use crate::stream::Stream;

/// Maximum number of simultaneously open streams (`ubufMAX_OPEN`).
pub const MAX_OPEN: usize = 3;

/// Request code for [`Table::ioctl`]: store the slot's backing address in
/// the caller's out-pointer. Mirrors `I_PTR_CNTL` in the source.
pub const I_PTR_CNTL: u32 = 1;

/// Capability a host provides to wire this table's descriptor range into
/// its own VFS namespace. Out of scope (`SPEC_FULL.md` §1, §2.1); the
/// table itself works with [`NullRegistry`] when no such wiring exists.
pub trait MountRegistry {
    /// Called once a stream has been assigned descriptor `fd` at `path`.
    fn register(&mut self, path: &str, fd: usize);
    /// Called when descriptor `fd` is closed.
    fn unregister(&mut self, fd: usize);
}

/// A [`MountRegistry`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRegistry;

impl MountRegistry for NullRegistry {
    fn register(&mut self, _path: &str, _fd: usize) {}
    fn unregister(&mut self, _fd: usize) {}
}

/// A fixed table of at most [`MAX_OPEN`] open streams, addressable by a
/// small integer descriptor.
pub struct Table<'a> {
    slots: [Option<Stream<'a>>; MAX_OPEN],
}

impl<'a> Table<'a> {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None, None, None],
        }
    }

    /// Open `storage` as a new stream and register it under `path`,
    /// returning its descriptor.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if no slot is free; [`Error::Invalid`] if
    /// `storage.len()` is outside `[MIN_SIZE, MAX_SIZE]` (propagated from
    /// [`Stream::open`]) or `path` does not start with `/`.
    pub fn open<R: MountRegistry>(
        &mut self,
        path: &str,
        storage: &'a mut [u8],
        flags: OpenFlags,
        registry: &mut R,
    ) -> Result<usize> {
        if !path.starts_with('/') {
            return Err(Error::Invalid);
        }
        let fd = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Resource)?;
        self.slots[fd] = Some(Stream::open(storage, flags)?);
        registry.register(path, fd);
        Ok(fd)
    }

    /// Close descriptor `fd`, freeing its slot.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] (EBADF-equivalent) if `fd` is out of range or
    /// already closed.
    pub fn close<R: MountRegistry>(&mut self, fd: usize, registry: &mut R) -> Result<()> {
        let slot = self.slots.get_mut(fd).ok_or(Error::Invalid)?;
        if slot.take().is_none() {
            return Err(Error::Invalid);
        }
        registry.unregister(fd);
        Ok(())
    }

    fn stream_mut(&mut self, fd: usize) -> Result<&mut Stream<'a>> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Error::Invalid)
    }

    /// Read from descriptor `fd`.
    pub fn read<S: Scheduler>(&mut self, fd: usize, dst: &mut [u8], sched: &S) -> Result<usize> {
        self.stream_mut(fd)?.read(dst, sched)
    }

    /// Write to descriptor `fd`.
    pub fn write<S: Scheduler>(&mut self, fd: usize, src: &[u8], sched: &S) -> Result<usize> {
        self.stream_mut(fd)?.write(src, sched)
    }

    /// `ioctl(fd, I_PTR_CNTL, ..)`: report whether `fd` names a live slot.
    ///
    /// The source returns the slot's raw memory address through an
    /// out-pointer; this crate has no address to hand back across a safe
    /// API, so `I_PTR_CNTL` instead confirms liveness and any other request
    /// fails, matching "any other request returns failure" (`SPEC_FULL.md`
    /// §6).
    pub fn ioctl(&self, fd: usize, request: u32) -> Result<()> {
        if request != I_PTR_CNTL {
            return Err(Error::Invalid);
        }
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .map(|_| ())
            .ok_or(Error::Invalid)
    }
}

impl Default for Table<'_> {
    fn default() -> Self {
        Self::new()
    }
}
