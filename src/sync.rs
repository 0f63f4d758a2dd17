//! The `ExclusionGuard` abstraction (`SPEC_FULL.md` §9).
//!
//! The source disables interrupts for a non-ISR caller and merely flags
//! `FF_FROMISR` for a caller that is already in one (`vBufIsrEntry`/
//! `vBufIsrExit` in `x_buffers.c`); `Stream` instead takes a per-buffer mutex
//! unless `NoLock` is set. Both collapse, in this crate, to the same
//! primitive: [`critical_section::with`], the mechanism `defmt-persist`
//! itself uses in `atomic_waker.rs` and `logger.rs` to guard shared state
//! from both thread and interrupt context.

/// Run `f` inside a critical section, unless `skip` is set.
///
/// `skip` is `true` when the caller has already established exclusivity,
/// either because it asserts single-threaded access (`NoLock`) or because it
/// is already executing inside the one critical section that matters
/// (`InIsr`, reported by [`crate::scheduler::Scheduler::in_isr`]).
#[inline]
pub(crate) fn guarded<R>(skip: bool, f: impl FnOnce() -> R) -> R {
    if skip {
        f()
    } else {
        critical_section::with(|_cs| f())
    }
}
