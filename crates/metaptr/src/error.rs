//! Error types for metaptr
//!
//! Storing an address is the only fallible operation in this crate. Tag
//! updates, arithmetic and comparisons are total.

use thiserror::Error;

/// A non-null address whose low bits were not zero for the pointee's alignment
///
/// Returned by every operation that stores an address. The receiver is left
/// exactly as it was before the call.
///
/// # Examples
///
/// ```
/// use metaptr::{AlignmentError, TaggedPointer};
///
/// let misaligned = 0x1001 as *mut u32;
/// let err = TaggedPointer::new(misaligned).unwrap_err();
/// assert_eq!(err, AlignmentError { address: 0x1001, align: 4 });
/// assert_eq!(err.misalignment(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("address {address:#x} is not aligned to {align} bytes")]
pub struct AlignmentError {
    /// The rejected address
    pub address: usize,

    /// Alignment required by the pointee type
    pub align: usize,
}

impl AlignmentError {
    /// Number of bytes the address sits past the previous aligned boundary
    ///
    /// `align` is a power of two for every error this crate returns. A
    /// hand-built value with `align == 0` reports the whole address.
    pub fn misalignment(&self) -> usize {
        self.address & self.align.wrapping_sub(1)
    }
}

/// Result type alias for address-storing operations
pub type Result<T> = std::result::Result<T, AlignmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let err = AlignmentError {
            address: 0x1003,
            align: 8,
        };
        assert_eq!(err.to_string(), "address 0x1003 is not aligned to 8 bytes");
    }

    #[test]
    fn test_misalignment() {
        let err = AlignmentError {
            address: 0x100e,
            align: 16,
        };
        assert_eq!(err.misalignment(), 0xe);
    }

    #[test]
    fn test_misalignment_zero_align() {
        let err = AlignmentError {
            address: 0x1001,
            align: 0,
        };
        assert_eq!(err.misalignment(), 0x1001);
    }
}
