//! Sign preserving bit shifts.
//!
//! Translated MIPS code relies on `SLL`, `SRL` and `SRA` behaving exactly like the R3000 does. The
//! [`Shift`] trait reproduces two's complement hardware shifts bit for bit: signed values are
//! shifted through their unsigned counterpart and right shifts are sign extended by hand, so the
//! result never depends on how the host treats negative integers.

/// An integer that can be shifted by a compile-time amount.
pub trait Shift: Copy {
    /// The width of this integer, in bits.
    const BITS: u32;

    /// Shifts left by `amount`, which is always `< BITS`.
    fn shl_bits(self, amount: u32) -> Self;

    /// Shifts right by `amount`, which is always `< BITS`. Signed integers fill the vacated high
    /// bits with copies of the sign bit.
    fn shr_bits(self, amount: u32) -> Self;

    /// Shifts this value left by `N` bits.
    #[inline(always)]
    fn left_shift<const N: u32>(self) -> Self {
        const { assert!(N < Self::BITS, "shift amount must be smaller than the integer width") };

        if N == 0 { self } else { self.shl_bits(N) }
    }

    /// Shifts this value right by `N` bits, sign extending signed integers.
    #[inline(always)]
    fn right_shift<const N: u32>(self) -> Self {
        const { assert!(N < Self::BITS, "shift amount must be smaller than the integer width") };

        if N == 0 { self } else { self.shr_bits(N) }
    }
}

macro_rules! impl_shift_unsigned {
    ($($type:ty),*) => {
        $(
            impl Shift for $type {
                const BITS: u32 = <$type>::BITS;

                #[inline(always)]
                fn shl_bits(self, amount: u32) -> Self {
                    self << amount
                }

                #[inline(always)]
                fn shr_bits(self, amount: u32) -> Self {
                    self >> amount
                }
            }
        )*
    };
}

macro_rules! impl_shift_signed {
    ($($type:ty => $unsigned:ty),*) => {
        $(
            impl Shift for $type {
                const BITS: u32 = <$type>::BITS;

                #[inline(always)]
                fn shl_bits(self, amount: u32) -> Self {
                    ((self as $unsigned) << amount) as $type
                }

                #[inline(always)]
                fn shr_bits(self, amount: u32) -> Self {
                    let bits = self as $unsigned;
                    let shifted = bits >> amount;

                    // all ones if the sign bit is set, zero otherwise
                    let sign = (0 as $unsigned).wrapping_sub(bits >> (<$type>::BITS - 1));
                    let fill = sign & !(<$unsigned>::MAX >> amount);

                    (shifted | fill) as $type
                }
            }
        )*
    };
}

impl_shift_unsigned! {
    u8,
    u16,
    u32,
    u64,
    usize
}

impl_shift_signed! {
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    isize => usize
}

/// Shifts `value` left by `N` bits. Free function form of [`Shift::left_shift`].
#[inline(always)]
pub fn left_shift<const N: u32, T: Shift>(value: T) -> T {
    value.left_shift::<N>()
}

/// Shifts `value` right by `N` bits, sign extending signed integers. Free function form of
/// [`Shift::right_shift`].
#[inline(always)]
pub fn right_shift<const N: u32, T: Shift>(value: T) -> T {
    value.right_shift::<N>()
}
