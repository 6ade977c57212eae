//! TaggedPointer - a raw pointer with a tag in its alignment bits
//!
//! Any properly aligned pointer to `T` has its low `log2(align_of::<T>())`
//! bits equal to zero. [`TaggedPointer`] stores a small integer in exactly
//! those bits, so the pointer and its tag share one machine word.
//!
//! ```text
//! raw word:  [ address with low k bits zero | tag (k bits) ]
//!
//! ptr()  = raw & !mask      tag() = raw & mask      mask = align - 1
//! ```
//!
//! The type does not own, allocate or free the pointee and never checks that
//! the address is live. The only thing it validates is the alignment of
//! addresses handed to it.
//!
//! # Example
//!
//! ```
//! use metaptr::TaggedPointer;
//!
//! let mut value = 7u32;
//! let raw = &mut value as *mut u32;
//! let mut tagged = TaggedPointer::new(raw).unwrap();
//!
//! tagged.set_tag(2);
//! tagged.set_bit::<0>();
//! assert_eq!(tagged.tag(), 3);
//! assert_eq!(tagged.ptr(), raw);
//! assert_eq!(unsafe { tagged.as_ref() }, Some(&7));
//! ```

use std::any;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr::{self, NonNull};

use crate::error::{AlignmentError, Result};
use crate::layout::TagLayout;

mod cmp;


/// TaggedPointer - non-owning pointer to `T` plus `TAG_BITS` bits of tag
///
/// The whole value is a single `*mut T` whose low bits hold the tag. All bit
/// manipulation keeps the pointer's provenance, so the address part remains
/// usable for dereferencing through the `unsafe` accessors.
///
/// Like a raw pointer it is `Copy` and neither `Send` nor `Sync`. Callers who
/// share a tagged pointer between threads do so through the packed word
/// ([`into_raw`](Self::into_raw) / [`from_raw`](Self::from_raw)) under their
/// own atomic discipline.
///
/// # Equality
///
/// Two `TaggedPointer`s are equal only if both address and tag match. Against
/// a plain `*mut T` / `*const T` only the address is compared.
pub struct TaggedPointer<T> {
    raw: *mut T,
}

/// Rejects tag bit positions that do not exist for `T` at monomorphization time.
trait TagBit<const POS: u32> {
    const VALID: ();
}

impl<T, const POS: u32> TagBit<POS> for T {
    const VALID: () = assert!(
        POS < TagLayout::of::<T>().bits(),
        "tag bit position out of range for this pointee type"
    );
}

impl<T> TaggedPointer<T> {
    /// Tag layout of pointers to `T`
    pub const LAYOUT: TagLayout = TagLayout::of::<T>();

    /// Required alignment of stored addresses
    pub const ALIGN: usize = Self::LAYOUT.align();

    /// Number of available tag bits, `log2(align_of::<T>())`
    pub const TAG_BITS: u32 = Self::LAYOUT.bits();

    /// Mask of the tag bits within the raw word
    pub const TAG_MASK: usize = Self::LAYOUT.mask();

    // ========================================================================
    // Construction
    // ========================================================================

    /// Null pointer with a zero tag
    #[inline]
    pub const fn null() -> Self {
        Self {
            raw: ptr::null_mut(),
        }
    }

    /// Wrap `ptr` with a zero tag
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if `ptr` is non-null and not aligned for `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use metaptr::TaggedPointer;
    ///
    /// let mut x = 0u64;
    /// let tagged = TaggedPointer::new(&mut x as *mut u64).unwrap();
    /// assert_eq!(tagged.tag(), 0);
    ///
    /// let odd = (&mut x as *mut u64).cast::<u8>().wrapping_add(1).cast::<u64>();
    /// assert!(TaggedPointer::new(odd).is_err());
    /// ```
    #[inline]
    pub fn new(ptr: *mut T) -> Result<Self> {
        Self::check_aligned(ptr)?;
        Ok(Self { raw: ptr })
    }

    /// Wrap `ptr` and store `tag` in one step
    ///
    /// Bits of `tag` above `TAG_BITS` are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if `ptr` is non-null and not aligned for `T`.
    #[inline]
    pub fn with_tag(ptr: *mut T, tag: usize) -> Result<Self> {
        let mut tagged = Self::new(ptr)?;
        tagged.set_tag(tag);
        Ok(tagged)
    }

    /// Rebuild a tagged pointer from its packed form
    ///
    /// Every bit pattern is valid: the low `TAG_BITS` bits are the tag and the
    /// rest is the address.
    #[inline]
    pub const fn from_raw(raw: *mut T) -> Self {
        Self { raw }
    }

    /// Packed pointer, address and tag together
    #[inline]
    pub const fn into_raw(self) -> *mut T {
        self.raw
    }

    /// Packed word as an integer
    #[inline]
    pub fn raw_word(&self) -> usize {
        self.raw.addr()
    }

    fn check_aligned(ptr: *mut T) -> Result<()> {
        let address = ptr.addr();
        if Self::LAYOUT.is_aligned(address) {
            return Ok(());
        }

        log::trace!(
            "rejected address {:#x} for {} (align {})",
            address,
            any::type_name::<T>(),
            Self::ALIGN
        );
        Err(AlignmentError {
            address,
            align: Self::ALIGN,
        })
    }

    // ========================================================================
    // Address
    // ========================================================================

    /// Address with the tag stripped
    #[inline]
    pub fn ptr(&self) -> *mut T {
        self.raw.map_addr(|addr| Self::LAYOUT.strip(addr))
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr().cast_const()
    }

    #[inline]
    pub fn as_non_null(&self) -> Option<NonNull<T>> {
        NonNull::new(self.ptr())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr().is_null()
    }

    #[inline]
    pub fn is_non_null(&self) -> bool {
        !self.is_null()
    }

    /// Replace the address, keeping the tag
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if `ptr` is non-null and misaligned. Nothing
    /// is modified in that case.
    pub fn set_ptr(&mut self, ptr: *mut T) -> Result<()> {
        Self::check_aligned(ptr)?;
        let tag = self.tag();
        self.raw = ptr.map_addr(|addr| addr | tag);
        Ok(())
    }

    /// Replace the address and clear the tag
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if `ptr` is non-null and misaligned. Nothing
    /// is modified in that case.
    pub fn reset(&mut self, ptr: *mut T) -> Result<()> {
        Self::check_aligned(ptr)?;
        self.raw = ptr;
        Ok(())
    }

    /// Replace both the address and the tag
    ///
    /// Alignment is checked before anything is written.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if `ptr` is non-null and misaligned. Nothing
    /// is modified in that case.
    pub fn reset_with_tag(&mut self, ptr: *mut T, tag: usize) -> Result<()> {
        *self = Self::with_tag(ptr, tag)?;
        Ok(())
    }

    /// Reinterpret the address as pointing to `U`
    ///
    /// Tag bits that do not fit in `U`'s layout are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AlignmentError`] if the address is misaligned for `U`.
    pub fn cast<U>(self) -> Result<TaggedPointer<U>> {
        TaggedPointer::with_tag(self.ptr().cast::<U>(), self.tag())
    }

    /// Shared reference to the pointee, `None` if null
    ///
    /// # Safety
    ///
    /// Same contract as [`pointer::as_ref`]: a non-null address must point to
    /// a live, initialized `T`, and the returned lifetime must not outlive it
    /// or alias a mutable borrow.
    #[inline]
    pub unsafe fn as_ref<'a>(&self) -> Option<&'a T> {
        unsafe { self.ptr().as_ref() }
    }

    /// Mutable reference to the pointee, `None` if null
    ///
    /// # Safety
    ///
    /// Same contract as [`pointer::as_mut`].
    #[inline]
    pub unsafe fn as_mut<'a>(&self) -> Option<&'a mut T> {
        unsafe { self.ptr().as_mut() }
    }

    /// Element `index` positions away from the address
    ///
    /// # Safety
    ///
    /// The address must be non-null and `ptr().offset(index)` must point to a
    /// live `T` inside the same allocation.
    #[inline]
    pub unsafe fn get<'a>(&self, index: isize) -> &'a T {
        unsafe { &*self.ptr().offset(index) }
    }

    /// Mutable element `index` positions away from the address
    ///
    /// # Safety
    ///
    /// Same as [`get`](Self::get), with no other live borrow of that element.
    #[inline]
    pub unsafe fn get_mut<'a>(&self, index: isize) -> &'a mut T {
        unsafe { &mut *self.ptr().offset(index) }
    }

    // ========================================================================
    // Tag (whole)
    // ========================================================================

    /// Current tag; bits above `TAG_BITS` are always zero
    #[inline]
    pub fn tag(&self) -> usize {
        Self::LAYOUT.extract(self.raw_word())
    }

    /// Store the low `TAG_BITS` bits of `tag`, leaving the address alone
    #[inline]
    pub fn set_tag(&mut self, tag: usize) {
        self.map_word(|raw| Self::LAYOUT.compose(raw, tag));
    }

    /// Set every tag bit
    #[inline]
    pub fn fill_tag(&mut self) {
        self.map_word(|raw| raw | Self::TAG_MASK);
    }

    /// Clear every tag bit
    #[inline]
    pub fn clear_tag(&mut self) {
        self.map_word(|raw| raw & !Self::TAG_MASK);
    }

    /// Invert every tag bit
    #[inline]
    pub fn flip_tag(&mut self) {
        self.map_word(|raw| raw ^ Self::TAG_MASK);
    }

    #[inline]
    fn map_word(&mut self, f: impl FnOnce(usize) -> usize) {
        self.raw = self.raw.map_addr(f);
    }

    // ========================================================================
    // Tag bits (position checked at compile time)
    // ========================================================================

    /// Read tag bit `POS`
    ///
    /// A `POS` that is not below `TAG_BITS` is rejected when the call is
    /// monomorphized. `u16` has one tag bit, so bit 0 is readable:
    ///
    /// ```
    /// use metaptr::TaggedPointer;
    ///
    /// assert!(!TaggedPointer::<u16>::null().bit::<0>());
    /// ```
    ///
    /// and bit 1 does not build:
    ///
    /// ```compile_fail
    /// use metaptr::TaggedPointer;
    ///
    /// let _ = TaggedPointer::<u16>::null().bit::<1>();
    /// ```
    #[inline]
    pub fn bit<const POS: u32>(&self) -> bool {
        let () = <T as TagBit<POS>>::VALID;
        self.raw_word() & (1usize << POS) != 0
    }

    /// Set tag bit `POS` to `value`
    #[inline]
    pub fn write_bit<const POS: u32>(&mut self, value: bool) {
        if value {
            self.set_bit::<POS>();
        } else {
            self.clear_bit::<POS>();
        }
    }

    /// Set tag bit `POS`
    ///
    /// Pointees with alignment 1 have no tag bits at all, so even bit 0 is
    /// rejected for them:
    ///
    /// ```compile_fail
    /// use metaptr::TaggedPointer;
    ///
    /// let mut tagged = TaggedPointer::<u8>::null();
    /// tagged.set_bit::<0>();
    /// ```
    #[inline]
    pub fn set_bit<const POS: u32>(&mut self) {
        let () = <T as TagBit<POS>>::VALID;
        self.map_word(|raw| raw | (1usize << POS));
    }

    #[inline]
    pub fn clear_bit<const POS: u32>(&mut self) {
        let () = <T as TagBit<POS>>::VALID;
        self.map_word(|raw| raw & !(1usize << POS));
    }

    #[inline]
    pub fn flip_bit<const POS: u32>(&mut self) {
        let () = <T as TagBit<POS>>::VALID;
        self.map_word(|raw| raw ^ (1usize << POS));
    }

    // ========================================================================
    // Tag bits (position checked at run time)
    // ========================================================================

    /// Read tag bit `pos`
    ///
    /// # Panics
    ///
    /// Panics if `pos >= TAG_BITS`. The `*_at` family is for positions only
    /// known at run time; prefer [`bit`](Self::bit) and friends otherwise.
    #[inline]
    #[track_caller]
    pub fn bit_at(&self, pos: u32) -> bool {
        self.raw_word() & Self::bit_mask(pos) != 0
    }

    /// # Panics
    ///
    /// Panics if `pos >= TAG_BITS`.
    #[inline]
    #[track_caller]
    pub fn write_bit_at(&mut self, pos: u32, value: bool) {
        if value {
            self.set_bit_at(pos);
        } else {
            self.clear_bit_at(pos);
        }
    }

    /// # Panics
    ///
    /// Panics if `pos >= TAG_BITS`.
    #[inline]
    #[track_caller]
    pub fn set_bit_at(&mut self, pos: u32) {
        let mask = Self::bit_mask(pos);
        self.map_word(|raw| raw | mask);
    }

    /// # Panics
    ///
    /// Panics if `pos >= TAG_BITS`.
    #[inline]
    #[track_caller]
    pub fn clear_bit_at(&mut self, pos: u32) {
        let mask = Self::bit_mask(pos);
        self.map_word(|raw| raw & !mask);
    }

    /// # Panics
    ///
    /// Panics if `pos >= TAG_BITS`.
    #[inline]
    #[track_caller]
    pub fn flip_bit_at(&mut self, pos: u32) {
        let mask = Self::bit_mask(pos);
        self.map_word(|raw| raw ^ mask);
    }

    #[track_caller]
    fn bit_mask(pos: u32) -> usize {
        match Self::LAYOUT.bit(pos) {
            Some(mask) => mask,
            None => panic!(
                "tag bit {} out of range for {} ({} tag bits)",
                pos,
                any::type_name::<T>(),
                Self::TAG_BITS
            ),
        }
    }

    // ========================================================================
    // Pointer arithmetic
    // ========================================================================

    /// Copy moved by `count` elements, tag preserved
    ///
    /// Uses wrapping arithmetic, so it never fails; moving by whole elements
    /// keeps the address aligned.
    #[inline]
    pub fn offset(self, count: isize) -> Self {
        let tag = self.tag();
        Self {
            raw: self.ptr().wrapping_offset(count).map_addr(|addr| addr | tag),
        }
    }

    /// Advance by one element (prefix form)
    #[inline]
    pub fn increment(&mut self) -> &mut Self {
        *self = self.offset(1);
        self
    }

    /// Step back one element (prefix form)
    #[inline]
    pub fn decrement(&mut self) -> &mut Self {
        *self = self.offset(-1);
        self
    }

    /// Advance by one element, returning the previous value
    #[inline]
    pub fn post_increment(&mut self) -> Self {
        let previous = *self;
        self.increment();
        previous
    }

    /// Step back one element, returning the previous value
    #[inline]
    pub fn post_decrement(&mut self) -> Self {
        let previous = *self;
        self.decrement();
        previous
    }
}

impl<T> Clone for TaggedPointer<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TaggedPointer<T> {}

impl<T> Default for TaggedPointer<T> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<'a, T> From<&'a T> for TaggedPointer<T> {
    #[inline]
    fn from(value: &'a T) -> Self {
        // References are always aligned.
        Self {
            raw: ptr::from_ref(value).cast_mut(),
        }
    }
}

impl<'a, T> From<&'a mut T> for TaggedPointer<T> {
    #[inline]
    fn from(value: &'a mut T) -> Self {
        Self {
            raw: ptr::from_mut(value),
        }
    }
}

impl<T> TryFrom<*mut T> for TaggedPointer<T> {
    type Error = AlignmentError;

    fn try_from(ptr: *mut T) -> Result<Self> {
        Self::new(ptr)
    }
}

impl<T> TryFrom<*const T> for TaggedPointer<T> {
    type Error = AlignmentError;

    fn try_from(ptr: *const T) -> Result<Self> {
        Self::new(ptr.cast_mut())
    }
}

impl<T> TryFrom<NonNull<T>> for TaggedPointer<T> {
    type Error = AlignmentError;

    fn try_from(ptr: NonNull<T>) -> Result<Self> {
        Self::new(ptr.as_ptr())
    }
}

impl<T> From<TaggedPointer<T>> for *mut T {
    /// Address with the tag stripped
    #[inline]
    fn from(tagged: TaggedPointer<T>) -> Self {
        tagged.ptr()
    }
}

impl<T> From<TaggedPointer<T>> for *const T {
    #[inline]
    fn from(tagged: TaggedPointer<T>) -> Self {
        tagged.as_ptr()
    }
}

impl<T> AddAssign<isize> for TaggedPointer<T> {
    #[inline]
    fn add_assign(&mut self, count: isize) {
        *self = self.offset(count);
    }
}

impl<T> SubAssign<isize> for TaggedPointer<T> {
    #[inline]
    fn sub_assign(&mut self, count: isize) {
        *self = self.offset(count.wrapping_neg());
    }
}

impl<T> Add<isize> for TaggedPointer<T> {
    type Output = Self;

    #[inline]
    fn add(self, count: isize) -> Self {
        self.offset(count)
    }
}

impl<T> Add<TaggedPointer<T>> for isize {
    type Output = TaggedPointer<T>;

    #[inline]
    fn add(self, tagged: TaggedPointer<T>) -> TaggedPointer<T> {
        tagged.offset(self)
    }
}

impl<T> Sub<isize> for TaggedPointer<T> {
    type Output = Self;

    #[inline]
    fn sub(self, count: isize) -> Self {
        self.offset(count.wrapping_neg())
    }
}
