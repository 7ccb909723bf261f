use thiserror::Error;

/// Error returned by allocators and by the growing operations of the containers
/// built on top of them.
///
/// The kind is stored inline: the error is produced on the out-of-memory path,
/// where boxing it would require yet another allocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> ErrorKind {
        self.0
    }

    pub fn capacity_overflow() -> Error {
        Error(ErrorKind::CapacityOverflow)
    }

    pub fn allocation_failed(size: usize, align: usize) -> Error {
        Error(ErrorKind::AllocationFailed { size, align })
    }

    pub fn limit_exceeded(requested: usize, remaining: usize) -> Error {
        Error(ErrorKind::LimitExceeded {
            requested,
            remaining,
        })
    }

    /// Returns `true` if the error was raised before any allocator call was made,
    /// because the requested size could not be represented.
    pub fn is_capacity_overflow(&self) -> bool {
        matches!(self.0, ErrorKind::CapacityOverflow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("capacity overflow")]
    CapacityOverflow,

    #[error("memory allocation of {size} bytes (align {align}) failed")]
    AllocationFailed { size: usize, align: usize },

    #[error("allocation limit exceeded: requested {requested} bytes, {remaining} remaining")]
    LimitExceeded { requested: usize, remaining: usize },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind)
    }
}

impl From<std::alloc::LayoutError> for Error {
    fn from(_: std::alloc::LayoutError) -> Self {
        Error::capacity_overflow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::capacity_overflow().to_string(), "capacity overflow");
        assert_eq!(
            Error::allocation_failed(64, 8).to_string(),
            "memory allocation of 64 bytes (align 8) failed"
        );
        assert_eq!(
            Error::limit_exceeded(100, 10).to_string(),
            "allocation limit exceeded: requested 100 bytes, 10 remaining"
        );
    }

    #[test]
    fn test_error_kind_roundtrip() {
        let e: Error = ErrorKind::AllocationFailed { size: 1, align: 1 }.into();
        assert!(!e.is_capacity_overflow());
        assert_eq!(
            e.into_kind(),
            ErrorKind::AllocationFailed { size: 1, align: 1 }
        );
    }

    #[test]
    fn test_layout_error_is_overflow() {
        let err = std::alloc::Layout::from_size_align(usize::MAX, 8).unwrap_err();
        assert!(Error::from(err).is_capacity_overflow());
    }
}
