//! Comparison, hashing and formatting for [`TaggedPointer`]
//!
//! Tagged-vs-tagged comparisons look at the whole packed word, so the tag
//! counts. Tagged-vs-raw comparisons look at the address only. Ordering is
//! always unsigned, which keeps addresses in the upper half of the address
//! space above the lower half.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::TaggedPointer;

// ============================================================================
// TaggedPointer vs TaggedPointer
// ============================================================================

impl<T> PartialEq for TaggedPointer<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw_word() == other.raw_word()
    }
}

impl<T> Eq for TaggedPointer<T> {}

impl<T> PartialOrd for TaggedPointer<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TaggedPointer<T> {
    /// Address first, then tag. Both fall out of comparing the packed word as
    /// an unsigned integer because the address occupies the high bits.
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw_word().cmp(&other.raw_word())
    }
}

impl<T> Hash for TaggedPointer<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw_word().hash(state);
    }
}

// ============================================================================
// TaggedPointer vs raw pointers (address only)
// ============================================================================

macro_rules! impl_raw_cmp {
    ($mutability:tt) => {
        impl<T> PartialEq<*$mutability T> for TaggedPointer<T> {
            #[inline]
            fn eq(&self, other: &*$mutability T) -> bool {
                self.ptr().addr() == other.addr()
            }
        }

        impl<T> PartialEq<TaggedPointer<T>> for *$mutability T {
            #[inline]
            fn eq(&self, other: &TaggedPointer<T>) -> bool {
                other.ptr().addr() == self.addr()
            }
        }

        impl<T> PartialOrd<*$mutability T> for TaggedPointer<T> {
            #[inline]
            fn partial_cmp(&self, other: &*$mutability T) -> Option<Ordering> {
                Some(self.ptr().addr().cmp(&other.addr()))
            }
        }

        impl<T> PartialOrd<TaggedPointer<T>> for *$mutability T {
            #[inline]
            fn partial_cmp(&self, other: &TaggedPointer<T>) -> Option<Ordering> {
                Some(self.addr().cmp(&other.ptr().addr()))
            }
        }
    };
}

impl_raw_cmp!(mut);
impl_raw_cmp!(const);

// ============================================================================
// Formatting
// ============================================================================

impl<T> fmt::Debug for TaggedPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggedPointer")
            .field("ptr", &self.ptr())
            .field("tag", &self.tag())
            .finish()
    }
}

/// Prints the address part exactly like the equivalent raw pointer.
impl<T> fmt::Pointer for TaggedPointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr(), f)
    }
}
