//! `SizedPool`: three preallocated scratch slabs leased by upper-bound size.
//!
//! Grounded on `x_buffers.c`'s `pvBufTake`/`xBufGive`, which hand out one of
//! `BufSmall`/`BufMedium`/`BufLarge` under a per-slab semaphore. This crate
//! replaces the semaphore with a spin-acquired [`AtomicBool`] guarded by
//! [`critical_section`] for the compare-and-set (`SPEC_FULL.md` §5), and
//! replaces the raw `void *` return value with an RAII [`PoolLease`] modeled
//! on `ring_buffer.rs`'s `GrantR`: the lease releases the slab on `Drop`
//! rather than requiring the caller to remember to call `xBufGive`.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::scheduler::Scheduler;

/// Size, in bytes, of the small slab (`SPEC_FULL.md` §6: `{64, 128, 256}`).
pub const SMALL: usize = 64;
/// Size, in bytes, of the medium slab.
pub const MEDIUM: usize = 128;
/// Size, in bytes, of the large slab.
pub const LARGE: usize = 256;

struct Slab<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    taken: AtomicBool,
}

// SAFETY: `storage` is only ever accessed through a `SlabLease`, and
// `try_acquire` hands out at most one at a time via the `taken` flag.
unsafe impl<const N: usize> Sync for Slab<N> {}

impl<const N: usize> Slab<N> {
    const fn new() -> Self {
        Self {
            storage: UnsafeCell::new([0; N]),
            taken: AtomicBool::new(false),
        }
    }

    fn try_acquire(&self) -> Option<SlabLease<'_, N>> {
        // Acquire: pairs with the Release store in `release`, ensuring we
        // see the zeroed-by-previous-leaseholder contents.
        if self.taken.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(SlabLease { slab: self })
        }
    }

    fn release(&self) {
        self.taken.store(false, Ordering::Release);
    }
}

/// An exclusive lease on one of [`SizedPool`]'s slabs.
///
/// Dereferences to `&[u8]` / `&mut [u8]` of the slab's fixed size. The lease
/// is returned to the pool when dropped.
struct SlabLease<'a, const N: usize> {
    slab: &'a Slab<N>,
}

impl<const N: usize> Deref for SlabLease<'_, N> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        // SAFETY: holding a `SlabLease` is proof of exclusive access, since
        // `Slab::try_acquire` only constructs one at a time per slab.
        unsafe { &*self.slab.storage.get() }
    }
}

impl<const N: usize> DerefMut for SlabLease<'_, N> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: see `Deref` above.
        unsafe { &mut *self.slab.storage.get() }
    }
}

impl<const N: usize> Drop for SlabLease<'_, N> {
    fn drop(&mut self) {
        self.slab.release();
    }
}

/// A lease on whichever of [`SizedPool`]'s three slabs satisfied the
/// request. Dereferences to a byte slice of at least the requested size.
pub enum PoolLease<'a> {
    /// Leased the [`SMALL`] slab.
    Small(SlabLease<'a, SMALL>),
    /// Leased the [`MEDIUM`] slab.
    Medium(SlabLease<'a, MEDIUM>),
    /// Leased the [`LARGE`] slab.
    Large(SlabLease<'a, LARGE>),
}

impl Deref for PoolLease<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Self::Small(l) => l,
            Self::Medium(l) => l,
            Self::Large(l) => l,
        }
    }
}

impl DerefMut for PoolLease<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Small(l) => l,
            Self::Medium(l) => l,
            Self::Large(l) => l,
        }
    }
}

/// Three preallocated, fixed-size scratch slabs, leased by upper-bound size.
///
/// There is exactly one slab of each size; a second concurrent request for
/// the same size class blocks (via the supplied [`Scheduler`]) until the
/// first lease is dropped.
pub struct SizedPool {
    small: Slab<SMALL>,
    medium: Slab<MEDIUM>,
    large: Slab<LARGE>,
}

impl SizedPool {
    /// Construct a new, empty pool. Typically stored in a `static`.
    pub const fn new() -> Self {
        Self {
            small: Slab::new(),
            medium: Slab::new(),
            large: Slab::new(),
        }
    }

    /// Lease the smallest slab that can hold `size` bytes, blocking until it
    /// is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Invalid`] if `size` exceeds [`LARGE`]; no slab can
    /// ever satisfy the request.
    pub fn acquire<S: Scheduler>(&self, size: usize, sched: &S) -> Result<PoolLease<'_>> {
        if size > LARGE {
            return Err(Error::Invalid);
        }
        loop {
            let lease = if size <= SMALL {
                self.small.try_acquire().map(PoolLease::Small)
            } else if size <= MEDIUM {
                self.medium.try_acquire().map(PoolLease::Medium)
            } else {
                self.large.try_acquire().map(PoolLease::Large)
            };
            if let Some(lease) = lease {
                return Ok(lease);
            }
            sched.yield_for(2);
        }
    }
}

impl Default for SizedPool {
    fn default() -> Self {
        Self::new()
    }
}
