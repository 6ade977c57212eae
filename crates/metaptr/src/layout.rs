//! Tag Layout
//!
//! Describes how many low bits of a pointer to `T` are free for a tag.
//!
//! ```text
//! usize (64-bit), T = u32 (align 4, 2 tag bits):
//! ┌──────────────────────────────────────────────┬──────┐
//! │              address (bits 63..2)            │ tag  │
//! │                                              │ 1..0 │
//! └──────────────────────────────────────────────┴──────┘
//! ```

use std::fmt;
use std::mem;

/// TagLayout - bit layout of a tagged pointer to one pointee type
///
/// Computed once per type via [`TagLayout::of`]; [`crate::TaggedPointer`]
/// exposes it as an associated constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagLayout {
    align: usize,
    bits: u32,
}

impl TagLayout {
    /// Layout for pointers to `T`
    ///
    /// # Examples
    /// ```
    /// use metaptr::TagLayout;
    ///
    /// assert_eq!(TagLayout::of::<u8>().bits(), 0);
    /// assert_eq!(TagLayout::of::<u32>().bits(), 2);
    /// assert_eq!(TagLayout::of::<u32>().mask(), 0b11);
    /// ```
    pub const fn of<T>() -> Self {
        Self::from_align(mem::align_of::<T>())
    }

    /// Layout for an explicit alignment
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    pub const fn from_align(align: usize) -> Self {
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        Self {
            align,
            bits: align.trailing_zeros(),
        }
    }

    /// Required byte alignment
    #[inline]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Number of tag bits, `log2(align)`
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Mask selecting the tag bits
    #[inline]
    pub const fn mask(&self) -> usize {
        self.align - 1
    }

    /// Largest storable tag
    #[inline]
    pub const fn max_tag(&self) -> usize {
        self.mask()
    }

    /// Check if an address is aligned
    #[inline]
    pub const fn is_aligned(&self, addr: usize) -> bool {
        addr & self.mask() == 0
    }

    /// Address part of a packed word
    #[inline]
    pub const fn strip(&self, raw: usize) -> usize {
        raw & !self.mask()
    }

    /// Tag part of a packed word
    #[inline]
    pub const fn extract(&self, raw: usize) -> usize {
        raw & self.mask()
    }

    /// Pack an address and a tag; excess bits of both are dropped
    #[inline]
    pub const fn compose(&self, addr: usize, tag: usize) -> usize {
        self.strip(addr) | self.extract(tag)
    }

    /// Single-bit mask for tag bit `pos`, `None` when out of range
    #[inline]
    pub const fn bit(&self, pos: u32) -> Option<usize> {
        if pos < self.bits {
            Some(1 << pos)
        } else {
            None
        }
    }
}

impl fmt::Display for TagLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "align={} bits={} mask={:#x}",
            self.align,
            self.bits,
            self.mask()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(64))]
    struct CacheLine;

    #[test]
    fn test_primitive_layouts() {
        assert_eq!(TagLayout::of::<u8>().bits(), 0);
        assert_eq!(TagLayout::of::<u16>().bits(), 1);
        assert_eq!(TagLayout::of::<u32>().bits(), 2);
        assert_eq!(TagLayout::of::<u64>().align(), mem::align_of::<u64>());
        assert_eq!(TagLayout::of::<CacheLine>().bits(), 6);
        assert_eq!(TagLayout::of::<CacheLine>().max_tag(), 63);
    }

    #[test]
    fn test_bits_match_alignment() {
        fn check<T>() {
            let layout = TagLayout::of::<T>();
            assert_eq!(1usize << layout.bits(), mem::align_of::<T>());
        }

        check::<u8>();
        check::<i16>();
        check::<f32>();
        check::<f64>();
        check::<u128>();
        check::<*const u8>();
        check::<String>();
        check::<Vec<i32>>();
        check::<Vec<String>>();
        check::<CacheLine>();
    }

    #[test]
    fn test_is_aligned() {
        let layout = TagLayout::from_align(8);
        assert!(layout.is_aligned(0));
        assert!(layout.is_aligned(0x1000));
        assert!(!layout.is_aligned(0x1004));
        assert!(!layout.is_aligned(usize::MAX));
    }

    #[test]
    fn test_strip_extract_compose() {
        let layout = TagLayout::from_align(4);
        let raw = layout.compose(0x1000, 0b111);
        assert_eq!(raw, 0x1003);
        assert_eq!(layout.strip(raw), 0x1000);
        assert_eq!(layout.extract(raw), 0b11);
        assert_eq!(layout.compose(0x1002, 0), 0x1000);
    }

    #[test]
    fn test_bit_mask() {
        let layout = TagLayout::from_align(4);
        assert_eq!(layout.bit(0), Some(0b01));
        assert_eq!(layout.bit(1), Some(0b10));
        assert_eq!(layout.bit(2), None);
        assert_eq!(TagLayout::of::<u8>().bit(0), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TagLayout::from_align(16).to_string(),
            "align=16 bits=4 mask=0xf"
        );
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_panics() {
        let _ = TagLayout::from_align(12);
    }
}
