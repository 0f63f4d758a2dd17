//! `Stream`: a blocking circular byte stream with three overflow policies.
//!
//! Grounded on `x_ubuf.c`/`x_ubuf.h`'s `ubuf_t` and its `xUBuf*` family.
//! `IdxWR`/`IdxRD`/`Used`/`Size` map directly onto this module's fields;
//! `xUBufLock`/`xUBufUnLock` become [`crate::sync::guarded`]; the three
//! `xUBufBlockSpace` branches (Truncate eviction, NonBlock EAGAIN, blocking
//! `vTaskDelay` loop) become [`Stream::make_space`]'s match arms.

use crate::error::{Error, Result};
use crate::flags::{FeatureFlags, OpenFlags};
use crate::scheduler::Scheduler;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const NUL: u8 = 0;

/// Minimum backing size for a [`Stream`] (`ubufSIZE_MINIMUM`).
pub const MIN_SIZE: usize = 32;
/// Maximum backing size for a [`Stream`] (`ubufSIZE_MAXIMUM`).
pub const MAX_SIZE: usize = 16384;
/// Default backing size (`ubufSIZE_DEFAULT`).
pub const DEFAULT_SIZE: usize = 1024;

/// A bounded FIFO byte stream with configurable overflow behavior.
pub struct Stream<'a> {
    storage: &'a mut [u8],
    idx_write: usize,
    idx_read: usize,
    used: usize,
    open_flags: OpenFlags,
    feature_flags: FeatureFlags,
}

impl<'a> Stream<'a> {
    /// Adopt `storage` as the ring's backing memory.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `storage.len()` is outside `[MIN_SIZE, MAX_SIZE]`.
    pub fn open(storage: &'a mut [u8], open_flags: OpenFlags) -> Result<Self> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&storage.len()) {
            return Err(Error::Invalid);
        }
        Ok(Self {
            storage,
            idx_write: 0,
            idx_read: 0,
            used: 0,
            open_flags,
            feature_flags: FeatureFlags::INIT,
        })
    }

    /// Skip the crate-wide critical section for single-threaded callers.
    pub fn set_no_lock(&mut self, no_lock: bool) {
        if no_lock {
            self.feature_flags |= FeatureFlags::NO_LOCK;
        } else {
            self.feature_flags -= FeatureFlags::NO_LOCK;
        }
    }

    #[inline]
    fn skip_guard(&self) -> bool {
        self.feature_flags.contains(FeatureFlags::NO_LOCK)
    }

    /// Report and clear the EAGAIN-equivalent condition left by a denied
    /// [`OpenFlags::NON_BLOCK`] write (`SPEC_FULL.md` §4.2, §6). Returns
    /// `true` once for each such denial, then `false` until the next one.
    pub fn take_error(&mut self) -> bool {
        let was_set = self.feature_flags.contains(FeatureFlags::STATE_ERROR);
        self.feature_flags -= FeatureFlags::STATE_ERROR;
        was_set
    }

    /// Bytes currently readable.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes currently writable.
    pub fn space(&self) -> usize {
        let skip = self.skip_guard();
        let (used, len) = (self.used, self.storage.len());
        crate::sync::guarded(skip, || len - used)
    }

    /// Length of the contiguous run readable in a single call without
    /// wrapping: `[idx_read, size)` if `idx_read >= idx_write`, else the
    /// full `used` count.
    pub fn used_block(&self) -> usize {
        let skip = self.skip_guard();
        let (read, write, used, len) = (self.idx_read, self.idx_write, self.used, self.storage.len());
        crate::sync::guarded(skip, || {
            if read >= write {
                len - read
            } else {
                used
            }
        })
    }

    /// Make room for `size` bytes per the stream's overflow policy.
    ///
    /// Returns the number of bytes the caller may now write, which can be
    /// less than `size` under [`OpenFlags::NON_BLOCK`].
    fn make_space<S: Scheduler>(&mut self, size: usize, sched: &S) -> Result<usize> {
        debug_assert!(size <= self.storage.len());
        let avail = self.storage.len() - self.used;
        if avail >= size {
            return Ok(size);
        }
        if self.open_flags.contains(OpenFlags::TRUNCATE) {
            let need = size - avail;
            let skip = self.skip_guard();
            let len = self.storage.len();
            let (read, used) = crate::sync::guarded(skip, || {
                let read = (self.idx_read + need) % len;
                let used = self.used - need;
                (read, used)
            });
            self.idx_read = read;
            self.used = used;
            Ok(size)
        } else if self.open_flags.contains(OpenFlags::NON_BLOCK) {
            self.feature_flags |= FeatureFlags::STATE_ERROR;
            Ok(avail)
        } else {
            while self.space() < size {
                sched.yield_for(2);
            }
            Ok(size)
        }
    }

    /// A non-blocking read of an empty stream reports [`Error::EndOfStream`]
    /// (`SPEC_FULL.md` §4.2): unlike the write side's [`Error::Congestion`],
    /// there is no partial-count value to hand back, so the read simply
    /// ends rather than reporting a denied operation.
    fn check_avail<S: Scheduler>(&mut self, sched: &S) -> Result<()> {
        if self.used > 0 {
            return Ok(());
        }
        if self.open_flags.contains(OpenFlags::NON_BLOCK) {
            return Err(Error::EndOfStream);
        }
        while self.used == 0 {
            sched.yield_for(2);
        }
        Ok(())
    }

    /// Write one byte, applying the overflow policy for a single byte of
    /// space.
    pub fn putc<S: Scheduler>(&mut self, byte: u8, sched: &S) -> Result<u8> {
        let got = self.make_space(1, sched)?;
        if got < 1 {
            return Err(Error::Congestion);
        }
        let skip = self.skip_guard();
        let (idx, len, storage) = (self.idx_write, self.storage.len(), &mut self.storage);
        crate::sync::guarded(skip, || storage[idx] = byte);
        self.idx_write = (self.idx_write + 1) % len;
        self.used += 1;
        Ok(byte)
    }

    /// Read one byte.
    ///
    /// When the stream drains to empty, both indices reset to `0`
    /// (`SPEC_FULL.md` §4.2).
    pub fn getc<S: Scheduler>(&mut self, sched: &S) -> Result<u8> {
        self.check_avail(sched)?;
        let skip = self.skip_guard();
        let (idx, len, storage) = (self.idx_read, self.storage.len(), &mut self.storage);
        let byte = crate::sync::guarded(skip, || storage[idx]);
        self.idx_read = (self.idx_read + 1) % len;
        self.used -= 1;
        if self.used == 0 {
            self.idx_read = 0;
            self.idx_write = 0;
        }
        Ok(byte)
    }

    /// Read a line, stopping at `\n` or NUL (terminator consumed, not
    /// stored), CR filtered, destination always NUL-terminated.
    ///
    /// Returns the number of bytes written on a terminated or size-capped
    /// line; [`Error::EndOfStream`] if the stream ended first.
    pub fn gets<S: Scheduler>(&mut self, dst: &mut [u8], sched: &S) -> Result<usize> {
        if dst.is_empty() {
            return Err(Error::Invalid);
        }
        let mut n = 0;
        while n + 1 < dst.len() {
            let c = match self.getc(sched) {
                Ok(c) => c,
                Err(e) => {
                    dst[n] = 0;
                    return Err(e);
                }
            };
            if c == LF || c == NUL {
                break;
            }
            if c == CR {
                continue;
            }
            dst[n] = c;
            n += 1;
        }
        dst[n] = 0;
        Ok(n)
    }

    /// Bulk write, applying the overflow policy for the whole span.
    pub fn write<S: Scheduler>(&mut self, src: &[u8], sched: &S) -> Result<usize> {
        if src.is_empty() {
            return Err(Error::Invalid);
        }
        let avail = self.make_space(src.len(), sched)?;
        let mut count = 0;
        let len = self.storage.len();
        let skip = self.skip_guard();
        while self.used < len && count < avail {
            let idx = self.idx_write;
            let byte = src[count];
            let storage = &mut self.storage;
            crate::sync::guarded(skip, || storage[idx] = byte);
            self.idx_write = (self.idx_write + 1) % len;
            self.used += 1;
            count += 1;
        }
        Ok(count)
    }

    /// Bulk read, copying up to `dst.len()` bytes.
    pub fn read<S: Scheduler>(&mut self, dst: &mut [u8], sched: &S) -> Result<usize> {
        if dst.is_empty() {
            return Err(Error::Invalid);
        }
        self.check_avail(sched)?;
        let mut count = 0;
        let len = self.storage.len();
        let skip = self.skip_guard();
        while self.used > 0 && count < dst.len() {
            let idx = self.idx_read;
            let storage = &self.storage;
            dst[count] = crate::sync::guarded(skip, || storage[idx]);
            self.idx_read = (self.idx_read + 1) % len;
            self.used -= 1;
            count += 1;
        }
        Ok(count)
    }

    /// Offset of the read cursor from the start of backing storage.
    pub fn tell_read(&self) -> usize {
        self.idx_read
    }

    /// Offset of the write cursor from the start of backing storage.
    pub fn tell_write(&self) -> usize {
        self.idx_write
    }

    /// Hand the readable span to `handler` in at most two calls, draining
    /// whatever it reports as consumed.
    ///
    /// If `idx_read >= idx_write`, the tail `[idx_read, size)` is offered
    /// first; on success (`handler` returns `> 0`) `used` is reduced by
    /// exactly the reported count and `idx_read` resets to `0`. Then, if
    /// bytes remain, `[0, idx_write)` is offered; on success `used` and
    /// `idx_write` reset to `0`. A handler error aborts and is propagated.
    ///
    /// `used` is decremented by what `handler` *reports* it wrote, not by
    /// the span length offered to it (`SPEC_FULL.md` §4.2, the resolved
    /// short-write open question).
    pub fn empty_block(&mut self, handler: &mut dyn FnMut(&[u8]) -> Result<usize>) -> Result<usize> {
        if self.used == 0 {
            return Ok(0);
        }
        let mut total = 0;
        if self.idx_read >= self.idx_write {
            let tail_len = self.storage.len() - self.idx_read;
            let n = handler(&self.storage[self.idx_read..self.idx_read + tail_len])?;
            if n > 0 {
                total += n;
                self.used -= n;
                self.idx_read = 0;
            }
        }
        if self.used > 0 {
            let n = handler(&self.storage[..self.idx_write])?;
            if n > 0 {
                total += n;
                self.used -= n;
                self.idx_write = 0;
            }
        }
        Ok(total)
    }
}
