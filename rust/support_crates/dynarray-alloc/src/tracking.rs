//! An allocator context that records its traffic and can enforce a byte limit.

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{Error, Global, RawAllocator, Result};

/// Forwards to an inner allocator while counting calls and live bytes.
///
/// When created with [`TrackingAllocator::with_limit`], requests that would bring the
/// number of live bytes above the limit fail with `LimitExceeded` and never reach the
/// inner allocator. This makes it a convenient way to inject allocation failures.
///
/// Containers usually hold it by reference (`&TrackingAllocator`), so several of them
/// can share one context and the statistics can be inspected while they are alive.
pub struct TrackingAllocator<A = Global> {
    inner: A,
    limit: Option<Remaining>,
    allocations: AtomicUsize,
    reallocations: AtomicUsize,
    releases: AtomicUsize,
    live_bytes: AtomicUsize,
    peak_bytes: AtomicUsize,
}

/// A point-in-time copy of the counters of a [`TrackingAllocator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    /// Number of successful `allocate` calls.
    pub allocations: usize,
    /// Number of successful `reallocate` calls.
    pub reallocations: usize,
    /// Number of `release` calls.
    pub releases: usize,
    /// Bytes currently handed out.
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached.
    pub peak_bytes: usize,
}

impl TrackingAllocator<Global> {
    pub fn new() -> TrackingAllocator<Global> {
        Self::wrap(Global)
    }

    /// Creates a tracking allocator that refuses to hold more than `limit` live bytes.
    pub fn with_limit(limit: usize) -> TrackingAllocator<Global> {
        Self::wrap_with_limit(Global, limit)
    }
}

impl<A> TrackingAllocator<A> {
    pub fn wrap(inner: A) -> TrackingAllocator<A> {
        TrackingAllocator {
            inner,
            limit: None,
            allocations: AtomicUsize::new(0),
            reallocations: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            peak_bytes: AtomicUsize::new(0),
        }
    }

    pub fn wrap_with_limit(inner: A, limit: usize) -> TrackingAllocator<A> {
        TrackingAllocator {
            limit: Some(Remaining::new(limit)),
            ..Self::wrap(inner)
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Returns the counters (possibly stale if other threads use the allocator).
    pub fn stats(&self) -> AllocStats {
        AllocStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            reallocations: self.reallocations.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            peak_bytes: self.peak_bytes.load(Ordering::Relaxed),
        }
    }

    /// Bytes still available under the limit, or `None` for an unlimited allocator.
    pub fn remaining(&self) -> Option<usize> {
        self.limit.as_ref().map(Remaining::read)
    }

    fn withdraw(&self, amount: usize) -> Result<()> {
        match &self.limit {
            Some(limit) if !limit.withdraw(amount) => {
                let remaining = limit.read();
                log::debug!(
                    "allocation of {amount} bytes refused, {remaining} bytes remaining"
                );
                Err(Error::limit_exceeded(amount, remaining))
            }
            _ => Ok(()),
        }
    }

    fn deposit(&self, amount: usize) {
        if let Some(limit) = &self.limit {
            limit.deposit(amount);
        }
    }

    fn grow_live(&self, amount: usize) {
        let live = self.live_bytes.fetch_add(amount, Ordering::AcqRel) + amount;
        self.peak_bytes.fetch_max(live, Ordering::AcqRel);
    }

    fn shrink_live(&self, amount: usize) {
        self.live_bytes.fetch_sub(amount, Ordering::AcqRel);
    }
}

impl Default for TrackingAllocator<Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> std::fmt::Debug for TrackingAllocator<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingAllocator")
            .field("stats", &self.stats())
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

unsafe impl<A: RawAllocator> RawAllocator for TrackingAllocator<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        self.withdraw(layout.size())?;
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                self.grow_live(layout.size());
                Ok(ptr)
            }
            Err(e) => {
                self.deposit(layout.size());
                Err(e)
            }
        }
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        let old_size = old_layout.size();
        if new_size > old_size {
            self.withdraw(new_size - old_size)?;
        }
        match unsafe { self.inner.reallocate(ptr, old_layout, new_size) } {
            Ok(new_ptr) => {
                self.reallocations.fetch_add(1, Ordering::Relaxed);
                if new_size > old_size {
                    self.grow_live(new_size - old_size);
                } else {
                    self.deposit(old_size - new_size);
                    self.shrink_live(old_size - new_size);
                }
                Ok(new_ptr)
            }
            Err(e) => {
                if new_size > old_size {
                    self.deposit(new_size - old_size);
                }
                Err(e)
            }
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { self.inner.release(ptr, layout) };
        self.releases.fetch_add(1, Ordering::Relaxed);
        self.deposit(layout.size());
        self.shrink_live(layout.size());
    }
}

/// Remaining byte budget; withdrawals never take it below zero.
struct Remaining(AtomicUsize);

impl Remaining {
    fn new(amount: usize) -> Remaining {
        Remaining(AtomicUsize::new(amount))
    }

    fn withdraw(&self, amount: usize) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        while current >= amount {
            match self.0.compare_exchange_weak(
                current,
                current - amount,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated) => current = updated,
            }
        }
        false
    }

    fn deposit(&self, amount: usize) {
        self.0.fetch_add(amount, Ordering::Release);
    }

    fn read(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_tracking_counts_calls() {
        let alloc = TrackingAllocator::new();
        let layout = Layout::from_size_align(64, 8).unwrap();
        let p = alloc.allocate(layout).unwrap();
        assert_eq!(alloc.stats().allocations, 1);
        assert_eq!(alloc.stats().live_bytes, 64);

        let p = unsafe { alloc.reallocate(p, layout, 256) }.unwrap();
        let stats = alloc.stats();
        assert_eq!(stats.reallocations, 1);
        assert_eq!(stats.live_bytes, 256);
        assert_eq!(stats.peak_bytes, 256);

        unsafe { alloc.release(p, Layout::from_size_align(256, 8).unwrap()) };
        let stats = alloc.stats();
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.peak_bytes, 256);
        assert_eq!(alloc.remaining(), None);
    }

    #[test]
    fn test_tracking_limit_refuses_allocation() {
        let alloc = TrackingAllocator::with_limit(100);
        let small = Layout::from_size_align(60, 1).unwrap();
        let p = alloc.allocate(small).unwrap();
        assert_eq!(alloc.remaining(), Some(40));

        let err = alloc.allocate(small).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::LimitExceeded {
                requested: 60,
                remaining: 40
            }
        );
        assert_eq!(alloc.stats().allocations, 1);

        unsafe { alloc.release(p, small) };
        assert_eq!(alloc.remaining(), Some(100));
    }

    #[test]
    fn test_tracking_limit_refuses_growth() {
        let alloc = TrackingAllocator::with_limit(128);
        let layout = Layout::from_size_align(64, 1).unwrap();
        let p = alloc.allocate(layout).unwrap();
        unsafe { p.as_ptr().write_bytes(5, 64) };

        let err = unsafe { alloc.reallocate(p, layout, 256) }.unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::LimitExceeded { .. }));
        assert_eq!(alloc.remaining(), Some(64));
        assert_eq!(alloc.stats().live_bytes, 64);

        // the old block is still intact
        assert_eq!(unsafe { p.as_ptr().add(63).read() }, 5);
        unsafe { alloc.release(p, layout) };
    }

    #[test]
    fn test_tracking_shared_by_reference() {
        let alloc = TrackingAllocator::new();
        let a = &alloc;
        let b = &alloc;
        let layout = Layout::from_size_align(16, 1).unwrap();
        let p = a.allocate(layout).unwrap();
        let q = b.allocate(layout).unwrap();
        assert_eq!(alloc.stats().live_bytes, 32);
        unsafe {
            a.release(q, layout);
            b.release(p, layout);
        }
        assert_eq!(alloc.stats().live_bytes, 0);
    }

    #[test]
    fn test_tracking_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrackingAllocator>();
    }
}
