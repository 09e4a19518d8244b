//! Bit-field overlay for packed hardware registers.
//!
//! A [`Register`] wraps a plain unsigned integer and exposes named fields
//! through [`Field`] descriptors. Reading or writing a field is a masked shift
//! on the raw value, so `get()` and `set()` always agree bit for bit with the
//! field accessors. Bit 0 is the least significant bit, matching the
//! datasheet numbering.

use std::fmt;

/// Unsigned integer widths that can back a [`Register`].
pub trait RegisterWord: Copy + Eq + Default + fmt::Debug {
    /// Width of the word in bits.
    const BITS: u32;

    fn to_u32(self) -> u32;

    /// Truncates `value` to the word width.
    fn from_u32(value: u32) -> Self;
}

macro_rules! register_word {
    ($($ty:ty),*) => {
        $(
            impl RegisterWord for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                fn to_u32(self) -> u32 {
                    self as u32
                }

                #[inline]
                fn from_u32(value: u32) -> Self {
                    value as $ty
                }
            }
        )*
    };
}

register_word!(u8, u16);

/// Location of a packed field: `width` bits starting at bit `shift`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Field {
    shift: u32,
    width: u32,
}

impl Field {
    pub const fn new(shift: u32, width: u32) -> Self {
        assert!(width > 0 && shift + width <= 16);
        Self { shift, width }
    }

    /// A single-bit field.
    pub const fn bit(shift: u32) -> Self {
        Self::new(shift, 1)
    }

    pub const fn shift(self) -> u32 {
        self.shift
    }

    pub const fn width(self) -> u32 {
        self.width
    }

    /// Right-aligned mask covering `width` bits.
    #[inline]
    pub const fn value_mask(self) -> u32 {
        (1 << self.width) - 1
    }

    /// Mask of the field in place.
    #[inline]
    pub const fn mask(self) -> u32 {
        self.value_mask() << self.shift
    }
}

/// Raw register word with field accessors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Register<T>(T);

impl<T: RegisterWord> Register<T> {
    pub const fn new(raw: T) -> Self {
        Self(raw)
    }

    /// Raw value of the whole register.
    #[inline]
    pub fn get(self) -> T {
        self.0
    }

    /// Replaces the whole register.
    #[inline]
    pub fn set(&mut self, raw: T) {
        self.0 = raw;
    }

    /// Extracts `field`, right-aligned.
    #[inline]
    pub fn field(self, field: Field) -> T {
        debug_assert!(field.shift + field.width <= T::BITS);
        T::from_u32((self.0.to_u32() >> field.shift) & field.value_mask())
    }

    /// Writes `value` into `field`. Bits of `value` above the field width are
    /// discarded, every other field is left untouched.
    #[inline]
    pub fn set_field(&mut self, field: Field, value: T) {
        debug_assert!(field.shift + field.width <= T::BITS);
        let raw = self.0.to_u32();
        let packed = (value.to_u32() & field.value_mask()) << field.shift;
        self.0 = T::from_u32((raw & !field.mask()) | packed);
    }

    #[inline]
    pub fn flag(self, field: Field) -> bool {
        (self.0.to_u32() & field.mask()) != 0
    }

    #[inline]
    pub fn set_flag(&mut self, field: Field, on: bool) {
        let value = if on { T::from_u32(1) } else { T::default() };
        self.set_field(field, value);
    }
}

impl<T: RegisterWord> fmt::Debug for Register<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Register({:?})", self.0)
    }
}
