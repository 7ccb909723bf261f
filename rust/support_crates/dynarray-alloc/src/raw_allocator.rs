//! `RawAllocator`: the allocate/reallocate/release triple used by the containers.

use std::{alloc::Layout, ptr::NonNull};

use crate::Result;

/// A block allocator used by growable containers.
///
/// The allocator value itself is the allocation context: a container stores it next to
/// its buffer and hands `&self` to every operation that allocates or frees. Stateful
/// allocators (arenas, pools, budgets) keep their state behind interior mutability.
///
/// All three operations are required, so an allocator is always configured as a whole.
///
/// # Zero-size blocks
///
/// A zero-size layout is represented by a dangling, well-aligned pointer (see
/// [`dangling`]). `allocate` returns such a pointer for a zero-size request,
/// `reallocate` from a zero-size block behaves as `allocate`, and `release` of
/// a zero-size block does nothing.
///
/// # Safety
///
/// Implementors must guarantee that:
/// - A block returned by `allocate` or `reallocate` is valid for reads and writes of
///   at least the requested number of bytes and is aligned to the layout's alignment.
/// - `reallocate` preserves the first `min(old_size, new_size)` bytes of the block.
///   On success the old pointer must no longer be used; on failure the old block
///   remains valid and unchanged.
/// - A block stays valid until it is passed to `release` or `reallocate`.
pub unsafe trait RawAllocator {
    /// Allocates a block of at least `layout.size()` bytes.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Resizes the block at `ptr` to `new_size` bytes, keeping the alignment of `old_layout`.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a block obtained from this allocator with `old_layout`
    /// (or a dangling pointer when `old_layout.size() == 0`).
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>>;

    /// Releases the block at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a block obtained from this allocator with `layout`
    /// (or a dangling pointer when `layout.size() == 0`).
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A> RawAllocator for &A
where
    A: RawAllocator + ?Sized,
{
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        unsafe { (**self).reallocate(ptr, old_layout, new_size) }
    }

    #[inline]
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).release(ptr, layout) }
    }
}

/// Returns the sentinel pointer that stands for a zero-size block with the given alignment.
#[inline]
pub fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignment is never zero.
    unsafe { NonNull::new_unchecked(std::ptr::without_provenance_mut(layout.align())) }
}
