use std::{alloc::Layout, ptr::NonNull};

use crate::{Error, RawAllocator, Result, dangling};

/// The host's standard allocator (`std::alloc`).
///
/// This is the default binding of the allocator triple. It carries no state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

unsafe impl RawAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        if layout.size() == 0 {
            return Ok(dangling(layout));
        }
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| Error::allocation_failed(layout.size(), layout.align()))
    }

    unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_size: usize,
    ) -> Result<NonNull<u8>> {
        let new_layout = Layout::from_size_align(new_size, old_layout.align())?;
        if old_layout.size() == 0 {
            return self.allocate(new_layout);
        }
        if new_size == 0 {
            unsafe { self.release(ptr, old_layout) };
            return Ok(dangling(new_layout));
        }
        let new_ptr = unsafe { std::alloc::realloc(ptr.as_ptr(), old_layout, new_size) };
        NonNull::new(new_ptr).ok_or_else(|| Error::allocation_failed(new_size, old_layout.align()))
    }

    #[inline]
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_allocate_release() {
        let layout = Layout::from_size_align(100, 16).unwrap();
        let p = Global.allocate(layout).unwrap();
        assert_eq!(p.as_ptr() as usize % 16, 0);
        unsafe {
            p.as_ptr().write_bytes(0xAB, 100);
            Global.release(p, layout);
        }
    }

    #[test]
    fn test_global_zero_size() {
        let layout = Layout::from_size_align(0, 8).unwrap();
        let p = Global.allocate(layout).unwrap();
        assert_eq!(p, dangling(layout));
        unsafe { Global.release(p, layout) };
    }

    #[test]
    fn test_global_reallocate_preserves_prefix() {
        let layout = Layout::array::<u16>(4).unwrap();
        let p = Global.allocate(layout).unwrap();
        unsafe {
            let items = p.cast::<u16>().as_ptr();
            for i in 0..4 {
                items.add(i).write(i as u16 * 10);
            }
            let q = Global.reallocate(p, layout, 64).unwrap();
            let items = q.cast::<u16>().as_ptr();
            for i in 0..4 {
                assert_eq!(items.add(i).read(), i as u16 * 10);
            }
            Global.release(q, Layout::from_size_align(64, layout.align()).unwrap());
        }
    }

    #[test]
    fn test_global_reallocate_from_sentinel() {
        let empty = Layout::from_size_align(0, 4).unwrap();
        unsafe {
            let p = Global.reallocate(dangling(empty), empty, 32).unwrap();
            assert_ne!(p, dangling(empty));
            p.as_ptr().write_bytes(1, 32);
            Global.release(p, Layout::from_size_align(32, 4).unwrap());
        }
    }

    #[test]
    fn test_global_reallocate_to_zero() {
        let layout = Layout::from_size_align(8, 8).unwrap();
        let p = Global.allocate(layout).unwrap();
        let q = unsafe { Global.reallocate(p, layout, 0) }.unwrap();
        assert_eq!(q, dangling(layout));
    }
}
