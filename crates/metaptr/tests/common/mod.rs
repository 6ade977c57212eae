//! Shared fixtures for the metaptr integration tests
//!
//! Tests that dereference need real, live addresses; the fixture owns a small
//! array so every tagged pointer built from it points at valid memory.

#![allow(dead_code)]

use metaptr::TaggedPointer;

/// Number of slots in a fixture
pub const SLOT_COUNT: usize = 32;

/// ============================================================================
/// SLOT FIXTURE
/// ============================================================================

/// Owns `SLOT_COUNT` values of `T` to point into
pub struct Slots<T> {
    values: Box<[T]>,
}

impl<T: Copy> Slots<T> {
    /// Fill every slot with `value`
    pub fn filled(value: T) -> Self {
        Self {
            values: vec![value; SLOT_COUNT].into_boxed_slice(),
        }
    }
}

impl<T> Slots<T> {
    /// Pointer to slot `index`
    pub fn ptr(&mut self, index: usize) -> *mut T {
        assert!(index < SLOT_COUNT, "slot {} out of range", index);
        self.values.as_mut_ptr().wrapping_add(index)
    }

    /// Tagged pointer to slot `index` with `tag`
    pub fn tagged(&mut self, index: usize, tag: usize) -> TaggedPointer<T> {
        let ptr = self.ptr(index);
        TaggedPointer::with_tag(ptr, tag)
            .unwrap_or_else(|e| panic!("slot {} should be aligned: {}", index, e))
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// Address `bytes` past `ptr`, usually misaligned for `T`
pub fn byte_offset<T>(ptr: *mut T, bytes: usize) -> *mut T {
    ptr.cast::<u8>().wrapping_add(bytes).cast::<T>()
}

/// Assert that the address and tag of `tagged` are exactly as expected
pub fn assert_parts<T>(tagged: TaggedPointer<T>, ptr: *mut T, tag: usize, context: &str) {
    assert_eq!(
        tagged.ptr(),
        ptr,
        "{}: address {:p} differs from expected {:p}",
        context,
        tagged,
        ptr
    );
    assert_eq!(
        tagged.tag(),
        tag,
        "{}: tag {} differs from expected {}",
        context,
        tagged.tag(),
        tag
    );
}
