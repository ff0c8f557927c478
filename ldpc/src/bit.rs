//! Minimal capability trait for bit containers.
//!
//! Syndromes and key words are sequences of bits, but callers store them in
//! whatever container their protocol stack hands them: `bool`, packed-out
//! `u8` buffers, or wider integers holding only the values 0 and 1. Encoder
//! and decoder entry points are generic over this trait and nothing else.

/// A value usable as a binary matrix entry or syndrome bit.
///
/// Only the values "zero" and "one" are meaningful; any nonzero integer is
/// treated as one.
pub trait Bit: Copy {
    fn to_bool(self) -> bool;
    fn from_bool(b: bool) -> Self;
}

impl Bit for bool {
    #[inline]
    fn to_bool(self) -> bool {
        self
    }

    #[inline]
    fn from_bool(b: bool) -> Self {
        b
    }
}

macro_rules! impl_bit_for_uint {
    ($($t:ty),*) => {
        $(
            impl Bit for $t {
                #[inline]
                fn to_bool(self) -> bool {
                    self != 0
                }

                #[inline]
                fn from_bool(b: bool) -> Self {
                    b as $t
                }
            }
        )*
    };
}

impl_bit_for_uint!(u8, u16, u32, u64);

/// GF(2) addition of two bit values.
#[inline]
pub fn xor_as_bools<B: Bit>(lhs: B, rhs: B) -> B {
    B::from_bool(lhs.to_bool() != rhs.to_bool())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_impls() {
        assert!(bool::from_bool(true));
        assert_eq!(u8::from_bool(true), 1);
        assert_eq!(u16::from_bool(false), 0);
        assert!(3u32.to_bool());
        assert!(!0u64.to_bool());
    }

    #[test]
    fn test_xor_as_bools() {
        assert_eq!(xor_as_bools(1u8, 1u8), 0);
        assert_eq!(xor_as_bools(1u8, 0u8), 1);
        assert!(xor_as_bools(true, false));
        // any nonzero value counts as one
        assert_eq!(xor_as_bools(2u8, 1u8), 0);
    }
}
