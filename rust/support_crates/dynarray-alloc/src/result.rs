use std::alloc::Layout;

pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Computes the layout of an array of `count` elements of `T`.
///
/// Fails with `CapacityOverflow` when `count * size_of::<T>()` overflows or exceeds
/// `isize::MAX`.
#[inline]
pub fn array_layout<T>(count: usize) -> Result<Layout> {
    Ok(Layout::array::<T>(count)?)
}

#[cold]
pub fn capacity_overflow<T>() -> Result<T> {
    Err(crate::error::Error::capacity_overflow())
}
