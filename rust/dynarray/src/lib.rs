//! Allocator-pluggable dynamic arrays.
//!
//! [`DynamicArray`] is a growable contiguous buffer of `Copy` elements that stores its
//! allocator context next to the `(items, count, capacity)` header. Capacity doubles on
//! growth, starting from a configurable initial capacity (see [`policy`]).
//!
//! With the `string-builder` feature (on by default), byte arrays double as string
//! builders (`StringBuilder`).

mod array;
mod block;
pub mod policy;
#[cfg(feature = "string-builder")]
mod string_builder;

pub use array::DynamicArray;
pub use block::MemBlock;
pub use dynarray_alloc::{Error, ErrorKind, Global, RawAllocator, Result, TrackingAllocator};
pub use policy::{ArraySize, GrowthPolicy, Policy};
#[cfg(feature = "string-builder")]
pub use string_builder::StringBuilder;
