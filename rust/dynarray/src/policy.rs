//! Compile-time configuration of the dynamic array: the count/capacity integer type
//! and the capacity used on the first growth.

use std::marker::PhantomData;

use dynarray_alloc::{Error, Result};

/// Integer type used to store `count` and `capacity`.
pub trait ArraySize: Copy + Eq + Ord + Default + std::fmt::Debug {
    const ZERO: Self;

    fn to_usize(self) -> usize;

    /// Converts `n`, failing with `CapacityOverflow` if it does not fit.
    fn from_usize(n: usize) -> Result<Self>;

    /// Returns `self - 1`. `self` must be non-zero.
    fn dec(self) -> Self;
}

macro_rules! impl_array_size {
    ($($t:ty),*) => {
        $(
            impl ArraySize for $t {
                const ZERO: Self = 0;

                #[inline]
                fn to_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(n: usize) -> Result<Self> {
                    <$t>::try_from(n).map_err(|_| Error::capacity_overflow())
                }

                #[inline]
                fn dec(self) -> Self {
                    self - 1
                }
            }
        )*
    };
}

impl_array_size!(u8, u16, u32, u64, usize);

/// Growth configuration of a [`DynamicArray`](crate::DynamicArray).
pub trait GrowthPolicy {
    /// Type of the `count` and `capacity` fields.
    type Size: ArraySize;

    /// Capacity (in elements) allocated when an empty array grows for the first time.
    const INITIAL_CAPACITY: usize;
}

/// The standard growth policy: `S` for count/capacity, `INITIAL` elements on first growth.
pub struct Policy<S = usize, const INITIAL: usize = { DEFAULT_INITIAL_CAPACITY }>(PhantomData<S>);

impl<S: ArraySize, const INITIAL: usize> GrowthPolicy for Policy<S, INITIAL> {
    type Size = S;
    const INITIAL_CAPACITY: usize = INITIAL;
}

/// Default initial capacity.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Capacity after a single-element growth: double, or the initial capacity when empty.
///
/// An initial capacity of zero is treated as one.
#[inline]
pub fn next_capacity(capacity: usize, initial: usize) -> Result<usize> {
    if capacity > 0 {
        capacity.checked_mul(2).ok_or_else(Error::capacity_overflow)
    } else {
        Ok(initial.max(1))
    }
}

/// Capacity after a bulk growth that must hold at least `required` elements.
///
/// Follows the same doubling schedule as [`next_capacity`], so the result is the
/// capacity that `required - count` successive single appends would have reached.
/// A non-empty array therefore starts from `capacity * 2`, not from
/// `max(capacity * 2, initial)`: `bulk_capacity(2, 3, 16)` is 4.
pub fn bulk_capacity(capacity: usize, required: usize, initial: usize) -> Result<usize> {
    let mut new_capacity = next_capacity(capacity, initial)?;
    while new_capacity < required {
        new_capacity = new_capacity
            .checked_mul(2)
            .ok_or_else(Error::capacity_overflow)?;
    }
    Ok(new_capacity)
}
