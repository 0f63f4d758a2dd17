// tests/scenarios.rs
//! End-to-end scenarios exercising `DualBuffer`, `Stream`, and `HistoryRing`
//! together the way a single caller would, rather than one operation at a
//! time as the unit tests do.

use ringbuf_streams::dual_buffer::{CursorMode, DualBuffer, SeekFrom};
use ringbuf_streams::flags::{BufFlags, OpenFlags};
use ringbuf_streams::history::HistoryRing;
use ringbuf_streams::scheduler::SpinScheduler;
use ringbuf_streams::stream::Stream;
use ringbuf_streams::Error;

#[test]
fn scenario_linear_fill_drain_refill() {
    let mut storage = [0u8; 100];
    let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE, 0).unwrap();

    for i in 0..100u8 {
        buf.putc(b'0' + (i % 10)).unwrap();
    }
    assert_eq!(buf.available(), 100);
    assert_eq!(buf.space(), 0);
    assert_eq!(
        buf.tell(CursorMode::WRITE).unwrap(),
        buf.tell(CursorMode::READ).unwrap()
    );
    assert_eq!(buf.putc(b'Z'), Err(Error::EndOfStream));

    for i in 0..100u8 {
        assert_eq!(buf.getc().unwrap(), b'0' + (i % 10));
    }
    assert_eq!(buf.getc(), Err(Error::EndOfStream));
    assert_eq!(buf.tell(CursorMode::READ).unwrap(), 0);
    assert_eq!(buf.tell(CursorMode::WRITE).unwrap(), 0);
}

#[test]
fn scenario_linear_seek_then_read() {
    let mut storage = [0u8; 100];
    let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE, 0).unwrap();

    buf.seek(CursorMode::WRITE, SeekFrom::Start(100)).unwrap();
    assert_eq!(buf.available(), 100);
    assert_eq!(buf.space(), 0);

    buf.seek(CursorMode::WRITE, SeekFrom::End(-100)).unwrap();
    assert_eq!(buf.available(), 0);
    assert_eq!(buf.space(), 100);

    buf.seek(CursorMode::WRITE, SeekFrom::Start(50)).unwrap();
    assert_eq!(buf.available(), 50);

    buf.seek(CursorMode::READ, SeekFrom::Start(50)).unwrap();
    assert_eq!(buf.available(), 0);

    buf.seek(CursorMode::READ | CursorMode::WRITE, SeekFrom::Current(-50)).unwrap();
    assert_eq!(buf.tell(CursorMode::READ).unwrap(), 0);
    assert_eq!(buf.tell(CursorMode::WRITE).unwrap(), 0);
}

#[test]
fn scenario_compaction_reclaims_dead_span() {
    let mut storage = [0u8; 100];
    let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE, 0).unwrap();

    assert_eq!(buf.write(&[b'x'; 100], 1), 100);
    let mut drained = [0u8; 25];
    assert_eq!(buf.read(&mut drained, 1), 25);

    // No Packing yet: the tail behind `write` is exhausted and compaction
    // never runs, so there is nowhere to put the new 25 bytes.
    assert_eq!(buf.write(&[b'y'; 25], 1), 0);

    buf.set_packing(true);
    assert_eq!(buf.write(&[b'y'; 25], 1), 25);

    assert_eq!(buf.available(), 100);
    assert_eq!(buf.space(), 0);
}

#[test]
fn scenario_non_blocking_stream_then_truncate_reopen() {
    let sched = SpinScheduler;

    let mut storage = [0u8; 1024];
    let mut s = Stream::open(&mut storage, OpenFlags::NON_BLOCK).unwrap();
    for _ in 0..1024 {
        s.putc(b'a', &sched).unwrap();
    }
    assert_eq!(s.putc(b'A', &sched), Err(Error::Congestion));

    let mut dst = [0u8; 1024];
    assert_eq!(s.read(&mut dst, &sched).unwrap(), 1024);
    assert!(dst.iter().all(|&b| b == b'a'));
    assert_eq!(s.getc(&sched), Err(Error::EndOfStream));

    let mut storage2 = [0u8; 256];
    let mut s2 = Stream::open(&mut storage2, OpenFlags::TRUNCATE).unwrap();
    assert_eq!(s2.write(&[b'a'; 256], &sched).unwrap(), 256);
    assert_eq!(s2.write(b"0123456789", &sched).unwrap(), 10);
    assert_eq!(s2.used(), 256);

    let mut out = [0u8; 256];
    assert_eq!(s2.read(&mut out, &sched).unwrap(), 256);
    assert_eq!(&out[246..], b"0123456789");
}

#[test]
fn scenario_history_navigation_with_forced_eviction() {
    let mut storage = [0u8; 20];
    let mut h = HistoryRing::new(&mut storage);

    h.string_add(b"ab\0").unwrap();
    h.string_add(b"cd\0").unwrap();
    h.string_add(b"ef\0").unwrap();
    assert_eq!(h.count(), 3);

    // Not enough room for a 15-byte record (14 bytes of content + NUL)
    // without evicting; "ab" alone frees too little, so "ab" and "cd" both
    // get dropped and "ef" survives as the oldest record.
    h.string_add(b"01234567890123\0").unwrap();
    assert_eq!(h.count(), 2);

    let mut dst = [0u8; 16];
    let n = h.string_prv(&mut dst).unwrap();
    assert_eq!(&dst[..n], b"01234567890123");
    let n = h.string_prv(&mut dst).unwrap();
    assert_eq!(&dst[..n], b"ef");
}

#[test]
fn scenario_auto_crlf_two_byte_buffer() {
    let mut storage = [0u8; 2];
    let mut buf = DualBuffer::open(&mut storage, BufFlags::READ_WRITE, 0).unwrap();

    // Room for both characters: the CR/LF pair is written atomically.
    buf.putc(b'\n').unwrap();
    assert_eq!(buf.available(), 2);

    // Drain the CR, leaving one byte live and one slot free.
    assert_eq!(buf.getc().unwrap(), b'\r');
    assert_eq!(buf.available(), 1);

    // Room for only one character: writing the pair would be partial, so
    // the whole call is rejected and nothing changes.
    assert_eq!(buf.putc(b'\n'), Err(Error::EndOfStream));
    assert_eq!(buf.available(), 1);
    assert_eq!(buf.peek().unwrap(), b'\n');
}
