//! `DualBuffer`: a general-purpose linear-or-circular byte buffer.
//!
//! Grounded on `x_buffers.c`/`x_buffers.h`'s `buf_t` and its `xBuf*`/`vBuf*`
//! family. The source keeps `pBeg`/`pEnd`/`pRead`/`pWrite` as raw pointers
//! into a buffer the control struct does not own; this crate replaces that
//! with `usize` offsets into a slice the [`DualBuffer`] borrows for its
//! whole lifetime (`SPEC_FULL.md` §3), which also removes the need for the
//! source's `FF_BUFFALOC` bit (there is no allocate-on-open path here, so
//! closing a `DualBuffer` never has to decide whether to free anything).

use crate::error::{Error, Result};
use crate::flags::BufFlags;

/// Smallest well-formed offset a seek/tell call may land on.
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Which cursor an operation addresses. `seek` accepts both bits at once;
/// `tell`/`tell_pointer` require exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CursorMode(u8);

impl CursorMode {
    /// Addresses the read cursor.
    pub const READ: Self = Self(1 << 0);
    /// Addresses the write cursor.
    pub const WRITE: Self = Self(1 << 1);

    const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for CursorMode {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Origin a `seek` offset is relative to, mirroring `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SeekFrom {
    /// Relative to `begin` (offset 0).
    Start(isize),
    /// Relative to the cursor being moved.
    Current(isize),
    /// Relative to `end` (the slice length).
    End(isize),
}

/// A linear-or-circular byte buffer over caller-supplied storage.
///
/// `begin` is always `0` and `end` is always `storage.len()`; both are kept
/// conceptually (per `SPEC_FULL.md` §3) even though, unlike the source, this
/// struct has no fields literally named `pBeg`/`pEnd`.
pub struct DualBuffer<'a> {
    storage: &'a mut [u8],
    read: usize,
    write: usize,
    used: usize,
    flags: BufFlags,
}

impl<'a> DualBuffer<'a> {
    /// Adopt `storage` as backing memory, with `used` bytes already valid
    /// for reading starting at offset 0.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `used > storage.len()`.
    pub fn open(storage: &'a mut [u8], flags: BufFlags, used: usize) -> Result<Self> {
        if used > storage.len() {
            return Err(Error::Invalid);
        }
        Ok(Self {
            storage,
            read: 0,
            write: used,
            used,
            flags,
        })
    }

    #[inline]
    fn skip_guard(&self) -> bool {
        self.flags.contains(BufFlags::IN_ISR)
    }

    fn is_circular(&self) -> bool {
        self.flags.contains(BufFlags::CIRCULAR)
    }

    /// Toggle [`BufFlags::PACKING`] on an already-open buffer, so a caller
    /// can opt into auto-compaction once contention makes it worthwhile
    /// without having to reopen the buffer.
    pub fn set_packing(&mut self, enabled: bool) {
        if enabled {
            self.flags |= BufFlags::PACKING;
        } else {
            self.flags -= BufFlags::PACKING;
        }
    }

    /// Number of bytes currently available to read.
    pub fn available(&self) -> usize {
        self.used
    }

    /// Number of bytes currently free to write.
    ///
    /// If [`BufFlags::PACKING`] is set, attempts [`DualBuffer::compact`]
    /// first to maximize the contiguous span reported.
    pub fn space(&mut self) -> usize {
        if self.flags.contains(BufFlags::PACKING) {
            let _ = self.compact();
        }
        self.storage.len() - self.used
    }

    /// Reclaim the dead span before `read` by moving `[read, write)` to the
    /// front of the storage.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] in Circular mode, or if [`BufFlags::PACKING`] is
    /// not set.
    pub fn compact(&mut self) -> Result<usize> {
        if self.is_circular() || !self.flags.contains(BufFlags::PACKING) {
            return Err(Error::Invalid);
        }
        if self.read > 0 {
            let skip = self.skip_guard();
            let (read, write, used) = (self.read, self.write, self.used);
            let storage = &mut self.storage;
            crate::sync::guarded(skip, || {
                storage.copy_within(read..write, 0);
            });
            self.write = used;
            self.read = 0;
            for b in &mut self.storage[self.write..] {
                *b = 0;
            }
        }
        Ok(self.storage.len() - self.used)
    }

    /// Write one byte.
    ///
    /// In non-[`BufFlags::BINARY`] mode, a bare `\n` is preceded by an
    /// injected `\r`; if the `\r` cannot be stored the `\n` is not written
    /// either and the call reports [`Error::EndOfStream`] (the pair is
    /// atomic, partial writes are never observable).
    pub fn putc(&mut self, byte: u8) -> Result<u8> {
        if byte == LF && !self.flags.contains(BufFlags::BINARY) {
            if self.storage.len() - self.used < 2 {
                return Err(Error::EndOfStream);
            }
            self.store_one(CR);
        }
        if self.storage.len() == self.used {
            return Err(Error::EndOfStream);
        }
        self.store_one(byte);
        Ok(byte)
    }

    fn store_one(&mut self, byte: u8) {
        let skip = self.skip_guard();
        let (write, storage) = (self.write, &mut self.storage);
        crate::sync::guarded(skip, || {
            storage[write] = byte;
        });
        self.used += 1;
        self.write += 1;
        if self.write == self.storage.len() {
            self.write = 0;
        }
    }

    /// Read one byte, advancing the read cursor.
    ///
    /// In Linear mode, draining the last byte resets both cursors to 0
    /// (`SPEC_FULL.md` §4.1, "Linear auto-reset").
    pub fn getc(&mut self) -> Result<u8> {
        if self.used == 0 {
            return Err(Error::EndOfStream);
        }
        let skip = self.skip_guard();
        let circular = self.is_circular();
        let (read, storage) = (self.read, &mut self.storage);
        let byte = crate::sync::guarded(skip, || storage[read]);
        self.read += 1;
        self.used -= 1;
        if circular {
            if self.read == self.storage.len() {
                self.read = 0;
            }
        } else if self.used == 0 {
            self.read = 0;
            self.write = 0;
        }
        Ok(byte)
    }

    /// Read the next byte without advancing the read cursor.
    pub fn peek(&self) -> Result<u8> {
        if self.used == 0 {
            return Err(Error::EndOfStream);
        }
        Ok(self.storage[self.read])
    }

    /// Read a line into `dst`, stopping at `\n`, at `EndOfStream`, or after
    /// `dst.len() - 1` bytes, whichever comes first.
    ///
    /// Returns the number of bytes written (always NUL-terminated within
    /// `dst`, which must hold at least 1 byte) and whether a line terminator
    /// was actually seen: `Ok(n)` on a terminated or size-capped line,
    /// `Err(Error::EndOfStream)` if the stream ended first (the partial
    /// bytes already copied into `dst` are still valid and NUL-terminated).
    pub fn gets(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Err(Error::Invalid);
        }
        let mut n = 0;
        while n + 1 < dst.len() {
            let c = match self.getc() {
                Ok(c) => c,
                Err(_) => {
                    dst[n] = 0;
                    return Err(Error::EndOfStream);
                }
            };
            if c == LF {
                dst[n] = 0;
                return Ok(n);
            }
            if c == CR && !self.flags.contains(BufFlags::BINARY) {
                continue;
            }
            dst[n] = c;
            n += 1;
        }
        dst[n] = 0;
        Ok(n)
    }

    /// Bulk write, copying as many whole elements of `elem_size` as fit.
    ///
    /// Returns 0 in Circular mode (`SPEC_FULL.md` §4.1).
    pub fn write(&mut self, src: &[u8], elem_size: usize) -> usize {
        if self.is_circular() || elem_size == 0 {
            return 0;
        }
        let mut count = (src.len() / elem_size) * elem_size;
        let tail = self.storage.len() - self.write;
        if count > tail {
            let _ = self.compact();
            count = (self.storage.len() - self.write).min(count);
        }
        let skip = self.skip_guard();
        let (write, storage) = (self.write, &mut self.storage);
        crate::sync::guarded(skip, || {
            storage[write..write + count].copy_from_slice(&src[..count]);
        });
        self.write += count;
        self.used += count;
        count
    }

    /// Bulk read, copying as many whole elements of `elem_size` as are
    /// available.
    ///
    /// Returns 0 in Circular mode (`SPEC_FULL.md` §4.1).
    pub fn read(&mut self, dst: &mut [u8], elem_size: usize) -> usize {
        if self.is_circular() || elem_size == 0 {
            return 0;
        }
        let want = (dst.len() / elem_size) * elem_size;
        let count = want.min(self.used);
        let skip = self.skip_guard();
        let (read, storage) = (self.read, &mut self.storage);
        crate::sync::guarded(skip, || {
            dst[..count].copy_from_slice(&storage[read..read + count]);
        });
        self.read += count;
        self.used -= count;
        if self.used == 0 {
            self.read = 0;
            self.write = 0;
        }
        count
    }

    /// Move one or both cursors.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] in Circular mode.
    pub fn seek(&mut self, mode: CursorMode, from: SeekFrom) -> Result<()> {
        if self.is_circular() {
            return Err(Error::Invalid);
        }
        let len = self.storage.len() as isize;
        let skip = self.skip_guard();
        crate::sync::guarded(skip, || {
            if mode.contains(CursorMode::READ) {
                self.read = Self::clamp(Self::target(from, self.read, len), len);
            }
            if mode.contains(CursorMode::WRITE) {
                self.write = Self::clamp(Self::target(from, self.write, len), len);
            }
            self.used = self.write.saturating_sub(self.read);
        });
        Ok(())
    }

    fn target(from: SeekFrom, cur: usize, len: isize) -> isize {
        match from {
            SeekFrom::Start(off) => off,
            SeekFrom::Current(off) => cur as isize + off,
            SeekFrom::End(off) => len + off,
        }
    }

    fn clamp(pos: isize, len: isize) -> usize {
        if pos < 0 {
            debug_assert!(pos >= 0, "seek before begin");
            0
        } else if pos > len {
            debug_assert!(pos <= len, "seek beyond end");
            len as usize
        } else {
            pos as usize
        }
    }

    /// Offset of the read or write cursor from `begin`.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] in Circular mode, or if `mode` does not name
    /// exactly one cursor.
    pub fn tell(&self, mode: CursorMode) -> Result<usize> {
        if self.is_circular() {
            return Err(Error::Invalid);
        }
        if mode == CursorMode::READ {
            Ok(self.read)
        } else if mode == CursorMode::WRITE {
            Ok(self.write)
        } else {
            Err(Error::Invalid)
        }
    }

    /// Borrow the storage from the read or write cursor through `end`.
    ///
    /// # Errors
    ///
    /// Same as [`DualBuffer::tell`].
    pub fn tell_pointer(&self, mode: CursorMode) -> Result<&[u8]> {
        let at = self.tell(mode)?;
        Ok(&self.storage[at..])
    }

    /// Hand the readable span `[read, write)` to `sink`, then discard the
    /// handle. Thin wrapper over [`crate::report`] (`SPEC_FULL.md` §4.1).
    pub fn print_close(mut self, sink: &mut dyn crate::report::LineSink) -> Result<usize> {
        let n = self.available();
        let (a, b) = self.readable_spans();
        sink.write_bytes(a);
        sink.write_bytes(b);
        self.used = 0;
        Ok(n)
    }

    fn readable_spans(&self) -> (&[u8], &[u8]) {
        if self.write >= self.read {
            (&self.storage[self.read..self.write], &[])
        } else {
            (&self.storage[self.read..], &self.storage[..self.write])
        }
    }

    /// Log the buffer's final byte count at `priority` (a no-op without the
    /// `defmt` feature), then behave like [`DualBuffer::print_close`].
    pub fn log_close(self, priority: LogPriority, sink: &mut dyn crate::report::LineSink) -> Result<usize> {
        #[cfg(feature = "defmt")]
        {
            let n = self.available();
            match priority {
                LogPriority::Trace => defmt::trace!("DualBuffer close: {} bytes", n),
                LogPriority::Debug => defmt::debug!("DualBuffer close: {} bytes", n),
                LogPriority::Info => defmt::info!("DualBuffer close: {} bytes", n),
                LogPriority::Warn => defmt::warn!("DualBuffer close: {} bytes", n),
                LogPriority::Error => defmt::error!("DualBuffer close: {} bytes", n),
            }
        }
        #[cfg(not(feature = "defmt"))]
        let _ = priority;
        self.print_close(sink)
    }
}

/// Severity `log_close` reports the buffer's final contents at, mirroring
/// the `priority` argument the source passes through to `xSyslog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogPriority {
    /// Most verbose.
    Trace,
    /// Developer diagnostics.
    Debug,
    /// Routine informational output.
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Operation failed.
    Error,
}

/// Maximum number of simultaneously open [`DualBuffer`]s (`configBUFFERS_MAX_OPEN`).
pub const MAX_OPEN: usize = 10;

/// A fixed table of at most [`MAX_OPEN`] open buffers, addressable by a
/// small integer handle.
///
/// Grounded on `x_buffers.c`'s static `bufTable[configBUFFERS_MAX_OPEN]` and
/// its `vBufTakePointer`/`vBufGivePointer` pair: the source hands back a raw
/// pointer into that array as the "handle"; this crate hands back the array
/// index instead, since a raw pointer into a table this crate owns has no
/// safe Rust equivalent.
pub struct Table<'a> {
    slots: [Option<DualBuffer<'a>>; MAX_OPEN],
}

impl<'a> Table<'a> {
    /// An empty table.
    pub const fn new() -> Self {
        Self {
            slots: [None, None, None, None, None, None, None, None, None, None],
        }
    }

    /// Open `storage` as a new buffer, returning its handle.
    ///
    /// # Errors
    ///
    /// [`Error::Resource`] if no slot is free; errors from [`DualBuffer::open`]
    /// propagate unchanged.
    pub fn open(&mut self, storage: &'a mut [u8], flags: BufFlags, used: usize) -> Result<usize> {
        let handle = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Resource)?;
        self.slots[handle] = Some(DualBuffer::open(storage, flags, used)?);
        Ok(handle)
    }

    /// Close `handle`, freeing its slot.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `handle` is out of range or already closed.
    pub fn close(&mut self, handle: usize) -> Result<()> {
        let slot = self.slots.get_mut(handle).ok_or(Error::Invalid)?;
        if slot.take().is_none() {
            return Err(Error::Invalid);
        }
        Ok(())
    }

    /// Borrow the buffer at `handle`.
    ///
    /// # Errors
    ///
    /// [`Error::Invalid`] if `handle` is out of range or closed.
    pub fn get_mut(&mut self, handle: usize) -> Result<&mut DualBuffer<'a>> {
        self.slots
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or(Error::Invalid)
    }
}

impl Default for Table<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_linear(storage: &mut [u8]) -> DualBuffer<'_> {
        DualBuffer::open(storage, BufFlags::READ_WRITE, 0).unwrap()
    }

    #[test]
    fn putc_getc_roundtrip() {
        let mut storage = [0u8; 8];
        let mut buf = open_linear(&mut storage);
        buf.putc(b'a').unwrap();
        buf.putc(b'b').unwrap();
        assert_eq!(buf.available(), 2);
        assert_eq!(buf.getc().unwrap(), b'a');
        assert_eq!(buf.getc().unwrap(), b'b');
        assert_eq!(buf.available(), 0);
    }

    #[test]
    fn linear_auto_reset_after_drain() {
        let mut storage = [0u8; 4];
        let mut buf = open_linear(&mut storage);
        buf.putc(b'x').unwrap();
        buf.getc().unwrap();
        assert_eq!(buf.tell(CursorMode::READ).unwrap(), 0);
        assert_eq!(buf.tell(CursorMode::WRITE).unwrap(), 0);
    }

    #[test]
    fn putc_lf_injects_cr_atomically() {
        let mut storage = [0u8; 2];
        let mut buf = open_linear(&mut storage);
        buf.putc(b'a').unwrap();
        assert_eq!(buf.putc(LF), Err(Error::EndOfStream));
        assert_eq!(buf.available(), 1);
    }

    #[test]
    fn full_buffer_reports_end_of_stream() {
        let mut storage = [0u8; 1];
        let mut buf = open_linear(&mut storage);
        buf.putc(b'a').unwrap();
        assert_eq!(buf.putc(b'b'), Err(Error::EndOfStream));
    }

    #[test]
    fn gets_stops_at_lf_and_strips_cr() {
        let mut storage = [0u8; 16];
        let mut buf = open_linear(&mut storage);
        for c in b"hi\r\n" {
            buf.putc(*c).unwrap();
        }
        let mut dst = [0u8; 16];
        let n = buf.gets(&mut dst).unwrap();
        assert_eq!(&dst[..n], b"hi");
    }

    #[test]
    fn compact_moves_live_span_to_begin() {
        let mut storage = [0u8; 8];
        let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE | BufFlags::PACKING, 0).unwrap();
        for c in b"abcd" {
            buf.putc(*c).unwrap();
        }
        buf.getc().unwrap();
        buf.getc().unwrap();
        let space = buf.compact().unwrap();
        assert_eq!(buf.tell(CursorMode::READ).unwrap(), 0);
        assert_eq!(buf.available(), 2);
        assert_eq!(space, 6);
    }

    #[test]
    fn seek_clamps_and_recomputes_used() {
        let mut storage = [0u8; 8];
        let mut buf = open_linear(&mut storage);
        for c in b"abcd" {
            buf.putc(*c).unwrap();
        }
        buf.seek(CursorMode::READ, SeekFrom::Start(2)).unwrap();
        assert_eq!(buf.available(), 2);
        buf.seek(CursorMode::WRITE, SeekFrom::End(100)).unwrap();
        assert_eq!(buf.tell(CursorMode::WRITE).unwrap(), 8);
    }

    #[test]
    fn circular_mode_rejects_seek_tell_compact_write_read() {
        let mut storage = [0u8; 8];
        let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE | BufFlags::CIRCULAR, 0).unwrap();
        assert_eq!(buf.seek(CursorMode::READ, SeekFrom::Start(0)), Err(Error::Invalid));
        assert_eq!(buf.tell(CursorMode::READ), Err(Error::Invalid));
        assert_eq!(buf.compact(), Err(Error::Invalid));
        assert_eq!(buf.write(b"x", 1), 0);
        let mut dst = [0u8; 1];
        assert_eq!(buf.read(&mut dst, 1), 0);
    }

    #[test]
    fn circular_getc_wraps_read_cursor() {
        let mut storage = [0u8; 4];
        let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE | BufFlags::CIRCULAR, 0).unwrap();
        for c in b"ab" {
            buf.putc(*c).unwrap();
        }
        buf.getc().unwrap();
        buf.getc().unwrap();
        buf.putc(b'c').unwrap();
        buf.putc(b'd').unwrap();
        assert_eq!(buf.getc().unwrap(), b'c');
        assert_eq!(buf.getc().unwrap(), b'd');
    }

    #[test]
    fn log_close_reports_then_empties() {
        let mut storage = [0u8; 8];
        let mut buf = open_linear(&mut storage);
        for c in b"hi" {
            buf.putc(*c).unwrap();
        }
        let mut dst = [0u8; 8];
        let mut sink = crate::report::SliceSink::new(&mut dst);
        let n = buf.log_close(LogPriority::Debug, &mut sink).unwrap();
        assert_eq!(n, 2);
        assert_eq!(sink.written(), b"hi");
    }

    #[test]
    fn table_assigns_first_free_handle_and_closes() {
        let mut storage = [0u8; 16];
        let mut table = Table::new();
        let handle = table.open(&mut storage, BufFlags::READ_WRITE, 0).unwrap();
        assert_eq!(handle, 0);
        table.get_mut(handle).unwrap().putc(b'x').unwrap();
        table.close(handle).unwrap();
        assert_eq!(table.get_mut(handle), Err(Error::Invalid));
        assert_eq!(table.close(handle), Err(Error::Invalid));
    }

    #[test]
    fn table_exhaustion_is_resource_error() {
        let mut storages = [[0u8; 16]; MAX_OPEN + 1];
        let mut table = Table::new();
        let mut iter = storages.iter_mut();
        for _ in 0..MAX_OPEN {
            table.open(iter.next().unwrap(), BufFlags::READ_WRITE, 0).unwrap();
        }
        assert_eq!(
            table.open(iter.next().unwrap(), BufFlags::READ_WRITE, 0),
            Err(Error::Resource)
        );
    }
}
