//! Byte arrays used as string builders.
//!
//! A string builder is a `DynamicArray<u8>`: every array operation applies unchanged.
//! Nothing here appends a terminator implicitly; `count` is the number of bytes that
//! were explicitly appended.

use std::ffi::{CStr, c_char};

use dynarray_alloc::{Global, RawAllocator, Result, result::array_layout};

use crate::{DynamicArray, MemBlock, policy::GrowthPolicy, policy::Policy};

/// A dynamic array of bytes.
pub type StringBuilder<A = Global, P = Policy> = DynamicArray<u8, A, P>;

impl<A: RawAllocator, P: GrowthPolicy> DynamicArray<u8, A, P> {
    /// Appends a single zero byte.
    #[inline]
    pub fn append_null(&mut self) -> Result<()> {
        self.append(0).map(|_| ())
    }

    /// Appends the bytes of `s`, without its terminator.
    #[inline]
    pub fn append_cstr(&mut self, s: &CStr) -> Result<()> {
        self.append_many(s.to_bytes())
    }

    /// Appends the bytes of the nul-terminated string at `s`, without its terminator.
    ///
    /// # Safety
    ///
    /// `s` must point to a valid nul-terminated string that does not overlap this
    /// builder's buffer (see [`CStr::from_ptr`]).
    pub unsafe fn append_cstr_ptr(&mut self, s: *const c_char) -> Result<()> {
        let s = unsafe { CStr::from_ptr(s) };
        self.append_cstr(s)
    }

    #[inline]
    pub fn append_str(&mut self, s: &str) -> Result<()> {
        self.append_many(s.as_bytes())
    }

    #[inline]
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.append_many(bytes)
    }

    /// Copies the contents into a new block of `count + 1` bytes whose last byte is zero.
    ///
    /// The block is always terminated, whether or not the builder already ends with a
    /// zero byte. The builder itself is not modified.
    pub fn strdup(&self) -> Result<MemBlock<u8, A>>
    where
        A: Clone,
    {
        let count = self.count();
        let Some(len) = count.checked_add(1) else {
            return dynarray_alloc::result::capacity_overflow();
        };
        let layout = array_layout::<u8>(len)?;
        let ptr = self.allocator().allocate(layout)?;
        unsafe {
            std::ptr::copy_nonoverlapping(self.as_ptr(), ptr.as_ptr(), count);
            ptr.as_ptr().add(count).write(0);
            Ok(MemBlock::from_raw_parts_in(ptr, len, self.allocator().clone()))
        }
    }

    /// Interprets the contents as UTF-8.
    pub fn to_str(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_slice())
    }
}

impl<A: RawAllocator, P: GrowthPolicy> std::fmt::Write for DynamicArray<u8, A, P> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.append_str(s).map_err(|_| std::fmt::Error)
    }
}

impl<A: RawAllocator, P: GrowthPolicy> std::io::Write for DynamicArray<u8, A, P> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append_many(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::OutOfMemory, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
