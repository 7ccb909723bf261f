use std::{alloc::Layout, ptr::NonNull};

use dynarray_alloc::{Global, RawAllocator};

/// A fixed-size block of `T` owned by the caller, produced by
/// [`DynamicArray::memdup`](crate::DynamicArray::memdup) and by `strdup` on byte arrays.
///
/// The block is released through its allocator when dropped. Elements are not
/// dropped individually.
pub struct MemBlock<T: Copy, A: RawAllocator = Global> {
    ptr: NonNull<T>,
    len: usize,
    alloc: A,
}

impl<T: Copy, A: RawAllocator> MemBlock<T, A> {
    /// Takes ownership of a block of exactly `len` elements.
    ///
    /// # Safety
    ///
    /// `ptr` must have been obtained from `alloc` with the layout of `[T; len]`
    /// (or be dangling when that layout is zero-sized), and all `len` elements
    /// must be initialized.
    pub unsafe fn from_raw_parts_in(ptr: NonNull<T>, len: usize, alloc: A) -> MemBlock<T, A> {
        MemBlock { ptr, len, alloc }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Gives up ownership of the block without releasing it.
    ///
    /// The caller becomes responsible for releasing `ptr` through the returned
    /// allocator with the layout of `[T; len]`.
    pub fn into_raw_parts(self) -> (NonNull<T>, usize, A) {
        let this = std::mem::ManuallyDrop::new(self);
        let alloc = unsafe { std::ptr::read(&this.alloc) };
        (this.ptr, this.len, alloc)
    }
}

#[cfg(feature = "string-builder")]
impl<A: RawAllocator> MemBlock<u8, A> {
    /// Views the block as a C string ending at its first zero byte.
    ///
    /// Blocks produced by `strdup` always contain a terminator; `None` is returned
    /// only for blocks without any zero byte.
    pub fn as_c_str(&self) -> Option<&std::ffi::CStr> {
        std::ffi::CStr::from_bytes_until_nul(self.as_slice()).ok()
    }
}

impl<T: Copy, A: RawAllocator> Drop for MemBlock<T, A> {
    fn drop(&mut self) {
        let layout = Layout::array::<T>(self.len).expect("block layout");
        unsafe { self.alloc.release(self.ptr.cast(), layout) };
    }
}

impl<T: Copy, A: RawAllocator> std::ops::Deref for MemBlock<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Copy, A: RawAllocator> std::ops::DerefMut for MemBlock<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Copy + std::fmt::Debug, A: RawAllocator> std::fmt::Debug for MemBlock<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_slice().fmt(f)
    }
}

unsafe impl<T: Copy + Send, A: RawAllocator + Send> Send for MemBlock<T, A> {}

unsafe impl<T: Copy + Sync, A: RawAllocator + Sync> Sync for MemBlock<T, A> {}
