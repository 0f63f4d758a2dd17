//! The reporting sink `printClose`/`logClose` and the `xBufReport`/
//! `vUBufReport`/`xHBufReport` family delegate to.
//!
//! `printfx`/`syslog` are named out-of-scope collaborators (`SPEC_FULL.md`
//! §1, §4.1): this crate only needs the shape of the contract, not a
//! concrete transport. [`LineSink`] is that shape; hosts wire it to UART,
//! RTT, a log buffer, or anything else with a `write_bytes` of its own.

/// A destination for the bytes a `DualBuffer`/`Stream`/`HistoryRing`
/// reports when asked to print or log itself.
pub trait LineSink {
    /// Consume `bytes` verbatim. Implementations that can fail should swallow
    /// the error (reporting is best-effort, matching the source's `P()`/
    /// `xReport()`, neither of which returns an error a caller acts on).
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// A [`LineSink`] that discards everything, for hosts with no transport
/// wired up yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LineSink for NullSink {
    fn write_bytes(&mut self, _bytes: &[u8]) {}
}

/// A [`LineSink`] that accumulates into a caller-supplied fixed buffer,
/// useful for tests and for hosts that batch before a real transport call.
pub struct SliceSink<'a> {
    dst: &'a mut [u8],
    len: usize,
}

impl<'a> SliceSink<'a> {
    /// Wrap `dst`, starting empty.
    pub fn new(dst: &'a mut [u8]) -> Self {
        Self { dst, len: 0 }
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.dst[..self.len]
    }
}

impl LineSink for SliceSink<'_> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.dst.len() - self.len);
        self.dst[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }
}

/// Report a [`crate::dual_buffer::DualBuffer`]'s structural fields, mirroring
/// `xBufReport`'s `"B=%p E=%p R=%p W=%p S=%d U=%d"` line.
pub fn report_dual_buffer(sink: &mut dyn LineSink, capacity: usize, read: usize, write: usize, used: usize) {
    sink.write_bytes(b"B=0 E=");
    write_usize(sink, capacity);
    sink.write_bytes(b" R=");
    write_usize(sink, read);
    sink.write_bytes(b" W=");
    write_usize(sink, write);
    sink.write_bytes(b" S=");
    write_usize(sink, capacity);
    sink.write_bytes(b" U=");
    write_usize(sink, used);
}

/// Report a [`crate::stream::Stream`]'s structural fields, mirroring
/// `vUBufReport`.
pub fn report_stream(sink: &mut dyn LineSink, size: usize, used: usize, idx_read: usize, idx_write: usize) {
    sink.write_bytes(b"Size=");
    write_usize(sink, size);
    sink.write_bytes(b" Used=");
    write_usize(sink, used);
    sink.write_bytes(b" RD=");
    write_usize(sink, idx_read);
    sink.write_bytes(b" WR=");
    write_usize(sink, idx_write);
}

/// Report a [`crate::history::HistoryRing`]'s record count, mirroring
/// `xHBufReport`'s "No1=.. Cur=.. Free=.. Cnt=.." line.
pub fn report_history(sink: &mut dyn LineSink, count: usize) {
    sink.write_bytes(b"HBuf: Cnt=");
    write_usize(sink, count);
}

fn write_usize(sink: &mut dyn LineSink, mut value: usize) {
    let mut digits = [0u8; 20];
    let mut n = 0;
    if value == 0 {
        sink.write_bytes(b"0");
        return;
    }
    while value > 0 {
        digits[n] = b'0' + (value % 10) as u8;
        value /= 10;
        n += 1;
    }
    let mut rev = [0u8; 20];
    for i in 0..n {
        rev[i] = digits[n - 1 - i];
    }
    sink.write_bytes(&rev[..n]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_sink_accumulates() {
        let mut dst = [0u8; 32];
        let mut sink = SliceSink::new(&mut dst);
        report_dual_buffer(&mut sink, 64, 0, 4, 4);
        assert!(sink.written().starts_with(b"B=0 E=64"));
    }

    #[test]
    fn slice_sink_truncates_rather_than_panics() {
        let mut dst = [0u8; 4];
        let mut sink = SliceSink::new(&mut dst);
        sink.write_bytes(b"too long for the buffer");
        assert_eq!(sink.written().len(), 4);
    }

    #[test]
    fn write_usize_zero() {
        let mut dst = [0u8; 4];
        let mut sink = SliceSink::new(&mut dst);
        write_usize(&mut sink, 0);
        assert_eq!(sink.written(), b"0");
    }
}
