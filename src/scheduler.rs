//! The host scheduler capability.
//!
//! The RTOS task scheduler, its delay primitive, and interrupt detection are
//! named out-of-scope collaborators (see `SPEC_FULL.md` §1): this crate only
//! ever calls through the [`Scheduler`] trait, the same way a
//! `critical-section` consumer only ever calls through `critical_section::with`
//! and lets the host register the concrete implementation.

/// Capability a host provides so [`crate::stream::Stream`]'s blocking write
/// and read paths can suspend the calling task instead of spinning forever.
///
/// An implementation backed by FreeRTOS, Embassy, RTIC, or any other runtime
/// need only answer these three questions honestly; everything above this
/// trait treats suspension as opaque.
pub trait Scheduler {
    /// Yield the calling task for approximately `millis` milliseconds.
    ///
    /// Called in a loop by blocking operations; each call re-checks the
    /// condition it is waiting on, so the exact sleep granularity is not
    /// load-bearing as long as it is short (the source uses ~2 ms).
    fn yield_for(&self, millis: u32);

    /// Whether a cooperative scheduler is currently running.
    ///
    /// When `false`, [`Scheduler::yield_for`] is expected to busy-wait for
    /// an equivalent duration instead of handing control to a scheduler that
    /// is not there to give it back.
    fn is_running(&self) -> bool;

    /// Whether the caller is currently executing in interrupt context.
    ///
    /// [`crate::dual_buffer::DualBuffer`] uses this to decide whether a
    /// critical section needs to be entered at all: a caller already inside
    /// an ISR is, by construction, already exclusive.
    fn in_isr(&self) -> bool;
}

/// A [`Scheduler`] that never reports a cooperative scheduler running and
/// busy-waits by spinning.
///
/// This is the only `Scheduler` this crate ships. It is enough to exercise
/// the non-blocking and truncate-on-full code paths (which never actually
/// wait), and it lets a blocking wait make forward progress on a
/// single-core host under test without depending on any particular RTOS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinScheduler;

impl Scheduler for SpinScheduler {
    fn yield_for(&self, millis: u32) {
        // No wall-clock timer is in scope; approximate the yield with a
        // bounded spin so a misconfigured caller cannot hang forever.
        let spins = (millis as u64 + 1) * 1000;
        for _ in 0..spins {
            core::hint::spin_loop();
        }
    }

    fn is_running(&self) -> bool {
        false
    }

    fn in_isr(&self) -> bool {
        false
    }
}
