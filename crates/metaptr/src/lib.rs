//! metaptr - Pointers Carrying Metadata in Their Alignment Bits
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! This crate provides [`TaggedPointer<T>`], a raw pointer to `T` that also
//! stores a small integer ("tag") in the low bits of its address. The tag costs
//! no memory: it lives in bits that alignment guarantees are zero.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. ZERO-COST ABSTRACTION
//!    A `TaggedPointer<T>` is exactly one pointer wide and every operation is
//!    a handful of bit operations.
//!
//! 2. CHECKED AT THE BOUNDARY
//!    Storing a misaligned address is rejected with [`AlignmentError`] and
//!    leaves the receiver untouched. Everything else is total.
//!
//! 3. NON-OWNING
//!    The pointee's lifetime is managed elsewhere, exactly like `*mut T`.
//
// ============================================================================
// BIT LAYOUT
// ============================================================================
//
// Let A = align_of::<T>() (a power of two) and k = log2(A). Any valid address
// of a T satisfies addr mod A == 0, i.e. its low k bits are zero, so those
// bits can carry a k-bit tag:
//
// ```
// raw word (usize), T = u64 on a 64-bit target (A = 8, k = 3):
// ┌─────────────────────────────────────────────────────────┬─────────┐
// │                address bits 63..3                       │ tag 2..0│
// └─────────────────────────────────────────────────────────┴─────────┘
//
// address = raw & !(A - 1)
// tag     = raw &  (A - 1)
// raw     = address | tag
// ```
//
// The layout is the interoperability contract: code that inspects the packed
// word directly (for example a compare-and-swap loop over an AtomicPtr) sees
// exactly this.
//
// TAG WIDTH BY TYPE (typical 64-bit target):
// ------------------------------------------
// | T                     | A  | k |
// |-----------------------|----|---|
// | u8, bool              | 1  | 0 |
// | u16                   | 2  | 1 |
// | u32, f32              | 4  | 2 |
// | u64, usize, *const _  | 8  | 3 |
// | #[repr(align(64))] _  | 64 | 6 |
//
// A pointee with k = 0 still works; every tag operation is then a no-op.
// Over-aligning the pointee is the way to buy more tag bits.
//
// PROVENANCE:
// -----------
// The packed value is kept as a `*mut T`, and all masking goes through
// `map_addr`, so the address part keeps the provenance of the pointer it was
// built from and may be dereferenced by unsafe callers.

pub mod error;
pub mod layout;
pub mod tagged;

pub use error::{AlignmentError, Result};
pub use layout::TagLayout;
pub use tagged::TaggedPointer;

// Same size as a raw pointer, and no more thread-safe than one.
static_assertions::assert_eq_size!(TaggedPointer<u64>, *mut u64);
static_assertions::assert_eq_size!(TaggedPointer<u8>, usize);
static_assertions::assert_not_impl_any!(TaggedPointer<u64>: Send, Sync);
static_assertions::const_assert_eq!(TaggedPointer::<u8>::TAG_BITS, 0);
static_assertions::const_assert_eq!(TaggedPointer::<u32>::TAG_BITS, 2);
