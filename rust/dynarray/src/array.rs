use std::{marker::PhantomData, ptr::NonNull};

use dynarray_alloc::{
    Error, Global, RawAllocator, Result,
    result::{array_layout, capacity_overflow},
};

use crate::{
    MemBlock,
    policy::{ArraySize, GrowthPolicy, Policy, bulk_capacity, next_capacity},
};

/// A growable contiguous buffer of `T` that owns its allocator context.
///
/// The header is the triple `(items, count, capacity)`: elements `[0, count)` are live,
/// and the buffer holds `capacity` elements. The zero value (`items` dangling, both
/// counters zero) is fully usable and allocates on its first growth.
///
/// Elements are plain `Copy` values: nothing is dropped on `pop` or when the array is
/// released.
///
/// # Growth
///
/// - Appending to a full array doubles its capacity, or allocates
///   `P::INITIAL_CAPACITY` elements when the capacity is zero.
/// - `append_many` reallocates at most once, to the capacity the same doubling
///   schedule would reach.
/// - A failed growth returns an error and leaves the array untouched.
///
/// Growing operations may move the buffer, invalidating raw pointers into it.
pub struct DynamicArray<T: Copy, A: RawAllocator = Global, P: GrowthPolicy = Policy> {
    items: NonNull<T>,
    count: P::Size,
    capacity: P::Size,
    alloc: A,
    _policy: PhantomData<P>,
}

impl<T: Copy> DynamicArray<T> {
    /// Creates the zero value, backed by the host allocator.
    pub fn new() -> DynamicArray<T> {
        Self::new_in(Global)
    }

    /// Creates an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<DynamicArray<T>> {
        Self::with_capacity_in(capacity, Global)
    }
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> DynamicArray<T, A, P> {
    /// Creates the zero value with the given allocator context. Does not allocate.
    pub fn new_in(alloc: A) -> DynamicArray<T, A, P> {
        DynamicArray {
            items: NonNull::dangling(),
            count: P::Size::ZERO,
            capacity: P::Size::ZERO,
            alloc,
            _policy: PhantomData,
        }
    }

    /// Creates an empty array with room for `capacity` elements, allocated from `alloc`.
    ///
    /// A zero `capacity` yields the zero value without calling the allocator.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<DynamicArray<T, A, P>> {
        let size = P::Size::from_usize(capacity)?;
        if capacity == 0 {
            return Ok(Self::new_in(alloc));
        }
        let layout = array_layout::<T>(capacity)?;
        let items = alloc.allocate(layout)?.cast::<T>();
        Ok(DynamicArray {
            items,
            count: P::Size::ZERO,
            capacity: size,
            alloc,
            _policy: PhantomData,
        })
    }

    /// Builds an array around a caller-supplied buffer, taking ownership of it.
    ///
    /// Later growth reallocates `items` through `alloc`, and dropping the array
    /// releases it.
    ///
    /// # Safety
    ///
    /// - If `capacity > 0`, `items` must have been obtained from `alloc` with the layout
    ///   of `[T; capacity]`; otherwise it must be dangling and well-aligned.
    /// - `count <= capacity`, and elements `[0, count)` must be initialized.
    pub unsafe fn from_raw_parts_in(
        items: NonNull<T>,
        count: P::Size,
        capacity: P::Size,
        alloc: A,
    ) -> DynamicArray<T, A, P> {
        DynamicArray {
            items,
            count,
            capacity,
            alloc,
            _policy: PhantomData,
        }
    }

    /// Decomposes the array into its header and allocator without releasing the buffer.
    pub fn into_raw_parts(self) -> (NonNull<T>, P::Size, P::Size, A) {
        let this = std::mem::ManuallyDrop::new(self);
        let alloc = unsafe { std::ptr::read(&this.alloc) };
        (this.items, this.count, this.capacity, alloc)
    }

    /// Base address of the buffer (dangling while the capacity is zero).
    #[inline]
    pub fn items(&self) -> NonNull<T> {
        self.items
    }

    /// Number of live elements.
    #[inline]
    pub fn count(&self) -> usize {
        self.count.to_usize()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == P::Size::ZERO
    }

    /// Number of elements the buffer can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.to_usize()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.items.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.items.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.count()) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.count()) }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Appends `item` at index `count` and returns it.
    ///
    /// A full array grows before the store: to twice its capacity, or to the
    /// initial capacity when it has none.
    #[inline]
    pub fn append(&mut self, item: T) -> Result<T> {
        if self.count == self.capacity {
            self.grow_one()?;
        }
        let count = self.count();
        unsafe { self.items.as_ptr().add(count).write(item) };
        self.count = P::Size::from_usize(count + 1)?;
        Ok(item)
    }

    /// Appends a copy of every element of `src`.
    ///
    /// Reallocates at most once. Appending an empty slice is a no-op.
    pub fn append_many(&mut self, src: &[T]) -> Result<()> {
        let n = src.len();
        if n == 0 {
            return Ok(());
        }
        let count = self.count();
        let Some(required) = count.checked_add(n) else {
            return capacity_overflow();
        };
        if required > self.capacity() {
            let new_capacity = bulk_capacity(self.capacity(), required, P::INITIAL_CAPACITY)?;
            self.reallocate(new_capacity)?;
        }
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), self.items.as_ptr().add(count), n);
        }
        self.count = P::Size::from_usize(required)?;
        Ok(())
    }

    /// Appends every element produced by `iter`, stopping at the first failed growth.
    pub fn extend_from_iter<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        for item in iter {
            self.append(item)?;
        }
        Ok(())
    }

    /// Removes the last element and returns it.
    ///
    /// The slot is not cleared and the capacity is kept.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    #[inline]
    pub fn pop(&mut self) -> T {
        assert!(!self.is_empty(), "pop from an empty array");
        self.pop_unchecked()
    }

    /// Removes the last element and returns it, or `None` if the array is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            Some(self.pop_unchecked())
        }
    }

    /// Removes the last element and returns it, or returns `default` if the array is empty.
    #[inline]
    pub fn pop_or(&mut self, default: T) -> T {
        self.try_pop().unwrap_or(default)
    }

    /// Removes the last element and returns it; `default` is called only if the array
    /// is empty.
    #[inline]
    pub fn pop_or_else<F>(&mut self, default: F) -> T
    where
        F: FnOnce() -> T,
    {
        self.try_pop().unwrap_or_else(default)
    }

    /// Copies the live elements into a new block of exactly `count` elements, allocated
    /// from a clone of this array's allocator.
    ///
    /// The array itself is not modified. For an empty array the allocator is asked for
    /// a zero-size block.
    pub fn memdup(&self) -> Result<MemBlock<T, A>>
    where
        A: Clone,
    {
        let count = self.count();
        let layout = array_layout::<T>(count)?;
        let ptr = self.alloc.allocate(layout)?.cast::<T>();
        unsafe {
            std::ptr::copy_nonoverlapping(self.as_ptr(), ptr.as_ptr(), count);
            Ok(MemBlock::from_raw_parts_in(ptr, count, self.alloc.clone()))
        }
    }

    /// Releases the buffer through the allocator.
    ///
    /// Equivalent to dropping the array; freeing the zero value makes no allocator call.
    pub fn free(self) {
        drop(self)
    }
}

impl<T: Copy + bytemuck::NoUninit, A: RawAllocator, P: GrowthPolicy> DynamicArray<T, A, P> {
    /// Returns the live elements as raw bytes, `count * size_of::<T>()` of them.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> DynamicArray<T, A, P> {
    #[cold]
    fn grow_one(&mut self) -> Result<()> {
        let new_capacity = next_capacity(self.capacity(), P::INITIAL_CAPACITY)?;
        self.reallocate(new_capacity)
    }

    /// Moves the buffer to one of `new_capacity` elements.
    ///
    /// The header is updated only after the allocator succeeded.
    fn reallocate(&mut self, new_capacity: usize) -> Result<()> {
        let capacity = P::Size::from_usize(new_capacity)?;
        let old_layout = array_layout::<T>(self.capacity())?;
        let new_layout = array_layout::<T>(new_capacity)?;
        let items = unsafe {
            self.alloc
                .reallocate(self.items.cast(), old_layout, new_layout.size())
        }
        .inspect_err(|e: &Error| {
            log::debug!(
                "dynamic array growth {} -> {} elements failed: {e}",
                self.capacity(),
                new_capacity
            );
        })?;
        log::trace!(
            "dynamic array grow {} -> {} elements ({} bytes)",
            self.capacity(),
            new_capacity,
            new_layout.size()
        );
        self.items = items.cast();
        self.capacity = capacity;
        Ok(())
    }
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> Drop for DynamicArray<T, A, P> {
    fn drop(&mut self) {
        if self.capacity == P::Size::ZERO {
            return;
        }
        let layout = array_layout::<T>(self.capacity()).expect("array layout");
        log::trace!("dynamic array release {} elements", self.capacity());
        unsafe { self.alloc.release(self.items.cast(), layout) };
    }
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> std::ops::Deref for DynamicArray<T, A, P> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> std::ops::DerefMut for DynamicArray<T, A, P> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Copy, A: RawAllocator + Default, P: GrowthPolicy> Default for DynamicArray<T, A, P> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Copy + std::fmt::Debug, A: RawAllocator, P: GrowthPolicy> std::fmt::Debug
    for DynamicArray<T, A, P>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicArray")
            .field("items", &self.as_slice())
            .field("count", &self.count())
            .field("capacity", &self.capacity())
            .finish_non_exhaustive()
    }
}

unsafe impl<T: Copy + Send, A: RawAllocator + Send, P: GrowthPolicy> Send
    for DynamicArray<T, A, P>
{
}

unsafe impl<T: Copy + Sync, A: RawAllocator + Sync, P: GrowthPolicy> Sync
    for DynamicArray<T, A, P>
{
}

impl<T: Copy, A: RawAllocator, P: GrowthPolicy> DynamicArray<T, A, P> {
    #[inline]
    fn pop_unchecked(&mut self) -> T {
        self.count = self.count.dec();
        unsafe { self.items.as_ptr().add(self.count()).read() }
    }
}
