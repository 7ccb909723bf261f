//! Allocator interface shared by the dynamic array containers.
//!
//! # Modules
//!
//! - [`raw_allocator`]: the `RawAllocator` allocate/reallocate/release triple
//! - [`global`]: the default binding onto the host allocator
//! - [`tracking`]: an allocator context that counts traffic and can enforce a limit
//! - [`error`]: the error taxonomy of the growing operations

pub mod error;
pub mod global;
pub mod raw_allocator;
pub mod result;
pub mod tracking;

pub use error::{Error, ErrorKind};
pub use global::Global;
pub use raw_allocator::{RawAllocator, dangling};
pub use result::Result;
pub use tracking::{AllocStats, TrackingAllocator};
