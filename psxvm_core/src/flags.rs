//! A small container of bit flags with named, compile-time bound fields.

use std::fmt;

/// An unsigned integer that can back a [`Flags`] container.
pub trait FlagBits: Copy + Eq + Default + fmt::Binary {
    /// How many flags fit in this integer.
    const CAPACITY: u32;

    fn bit(self, index: u32) -> bool;
    fn with_bit(self, index: u32, value: bool) -> Self;
}

macro_rules! impl_flag_bits {
    ($($type:ty),*) => {
        $(
            impl FlagBits for $type {
                const CAPACITY: u32 = <$type>::BITS;

                #[inline(always)]
                fn bit(self, index: u32) -> bool {
                    (self >> index) & 1 != 0
                }

                #[inline(always)]
                fn with_bit(self, index: u32, value: bool) -> Self {
                    let mask: $type = 1 << index;
                    if value { self | mask } else { self & !mask }
                }
            }
        )*
    };
}

impl_flag_bits! {
    u8,
    u16,
    u32,
    u64
}

/// A fixed number of bit flags stored in an unsigned integer `B`.
///
/// Bit indices must be smaller than [`Flags::CAPACITY`]. Passing a larger index is a bug in the
/// caller and panics.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags<B>(B);

pub type Flags8 = Flags<u8>;
pub type Flags16 = Flags<u16>;
pub type Flags32 = Flags<u32>;
pub type Flags64 = Flags<u64>;

impl<B: FlagBits> fmt::Debug for Flags<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:#b})", self.0)
    }
}

impl<B: FlagBits> Flags<B> {
    /// The maximum number of flags that can be stored.
    pub const CAPACITY: u32 = B::CAPACITY;

    /// Creates a new [`Flags`] from raw bits.
    #[inline(always)]
    pub const fn from_bits(bits: B) -> Self {
        Self(bits)
    }

    /// The raw bits of these flags.
    #[inline(always)]
    pub fn bits(&self) -> B {
        self.0
    }

    #[inline(always)]
    fn check(bit: u32) {
        assert!(
            bit < Self::CAPACITY,
            "flag bit {bit} out of range (capacity is {})",
            Self::CAPACITY
        );
    }

    /// Returns the value of the given flag.
    #[inline(always)]
    pub fn get(&self, bit: u32) -> bool {
        Self::check(bit);
        self.0.bit(bit)
    }

    /// Sets the given flag, leaving every other flag untouched.
    #[inline(always)]
    pub fn set(&mut self, bit: u32) {
        Self::check(bit);
        self.0 = self.0.with_bit(bit, true);
    }

    /// Clears the given flag, leaving every other flag untouched.
    #[inline(always)]
    pub fn clear(&mut self, bit: u32) {
        Self::check(bit);
        self.0 = self.0.with_bit(bit, false);
    }

    /// Sets or clears the given flag.
    #[inline(always)]
    pub fn set_to(&mut self, bit: u32, value: bool) {
        Self::check(bit);
        self.0 = self.0.with_bit(bit, value);
    }

    /// Returns a read/write lens onto flag `BIT`.
    #[inline(always)]
    pub fn field<const BIT: u32>(&mut self) -> Field<'_, B, BIT> {
        const { assert!(BIT < B::CAPACITY, "field bit out of range") };
        Field { flags: self }
    }

    /// Returns a read-only lens onto flag `BIT`.
    #[inline(always)]
    pub fn field_ref<const BIT: u32>(&self) -> FieldRef<'_, B, BIT> {
        const { assert!(BIT < B::CAPACITY, "field bit out of range") };
        FieldRef { flags: self }
    }
}

/// A single flag of a [`Flags`] container, bound to bit `BIT`.
pub struct Field<'a, B, const BIT: u32> {
    flags: &'a mut Flags<B>,
}

impl<B: FlagBits, const BIT: u32> Field<'_, B, BIT> {
    #[inline(always)]
    pub fn get(&self) -> bool {
        self.flags.0.bit(BIT)
    }

    #[inline(always)]
    pub fn set(&mut self) {
        self.flags.0 = self.flags.0.with_bit(BIT, true);
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.flags.0 = self.flags.0.with_bit(BIT, false);
    }

    #[inline(always)]
    pub fn set_to(&mut self, value: bool) {
        self.flags.0 = self.flags.0.with_bit(BIT, value);
    }
}

/// A read-only view of a single flag of a [`Flags`] container, bound to bit `BIT`.
#[derive(Clone, Copy)]
pub struct FieldRef<'a, B, const BIT: u32> {
    flags: &'a Flags<B>,
}

impl<B: FlagBits, const BIT: u32> FieldRef<'_, B, BIT> {
    #[inline(always)]
    pub fn get(&self) -> bool {
        self.flags.0.bit(BIT)
    }
}

impl<B: FlagBits, const BIT: u32> From<FieldRef<'_, B, BIT>> for bool {
    fn from(value: FieldRef<'_, B, BIT>) -> Self {
        value.get()
    }
}

/// Defines a pair of accessor methods returning a [`Field`] and a [`FieldRef`] for one flag of a
/// [`Flags`] member. Must be used inside an `impl` block.
///
/// ```
/// use psxvm_core::{flags::Flags16, flags_field};
///
/// struct Door {
///     flags: Flags16,
/// }
///
/// impl Door {
///     flags_field!(pub locked, is_locked => flags: u16[3]);
/// }
///
/// let mut door = Door { flags: Flags16::default() };
/// door.locked().set();
/// assert!(door.is_locked().get());
/// assert_eq!(door.flags.bits(), 0b1000);
/// ```
#[macro_export]
macro_rules! flags_field {
    ($(#[$meta:meta])* $vis:vis $name:ident, $name_ref:ident => $holder:ident: $bits:ty[$bit:expr]) => {
        $(#[$meta])*
        #[inline(always)]
        $vis fn $name(&mut self) -> $crate::flags::Field<'_, $bits, { $bit }> {
            self.$holder.field::<{ $bit }>()
        }

        $(#[$meta])*
        #[inline(always)]
        $vis fn $name_ref(&self) -> $crate::flags::FieldRef<'_, $bits, { $bit }> {
            self.$holder.field_ref::<{ $bit }>()
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Mobj {
        flags: Flags32,
    }

    impl Mobj {
        flags_field!(solid, is_solid => flags: u32[1]);
        flags_field!(shootable, is_shootable => flags: u32[2]);
        flags_field!(
            /// The top bit.
            corpse, is_corpse => flags: u32[31]
        );
    }

    #[test]
    fn fields_bind_to_their_bit() {
        let mut mobj = Mobj::default();

        mobj.shootable().set();
        assert!(mobj.is_shootable().get());
        assert!(!mobj.is_solid().get());
        assert_eq!(mobj.flags.bits(), 0b100);

        mobj.corpse().set_to(true);
        assert_eq!(mobj.flags.bits(), 0x8000_0004);

        mobj.shootable().clear();
        assert!(!bool::from(mobj.is_shootable()));
        assert_eq!(mobj.flags.bits(), 0x8000_0000);
    }

    #[test]
    fn field_and_runtime_access_agree() {
        let mut flags = Flags8::from_bits(0);
        flags.field::<7>().set();
        assert!(flags.get(7));
        assert!(flags.field_ref::<7>().get());

        flags.set_to(7, false);
        assert!(!flags.field::<7>().get());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn bit_past_capacity_panics() {
        let flags = Flags16::default();
        flags.get(16);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn set_past_capacity_panics() {
        let mut flags = Flags8::default();
        flags.set(8);
    }

    proptest::proptest! {
        #[test]
        fn set_then_clear(initial in any::<u64>(), bit in 0u32..64) {
            let mut flags = Flags64::from_bits(initial);

            flags.set(bit);
            prop_assert!(flags.get(bit));

            flags.clear(bit);
            prop_assert!(!flags.get(bit));

            flags.set_to(bit, true);
            prop_assert!(flags.get(bit));
            flags.set_to(bit, false);
            prop_assert!(!flags.get(bit));
        }

        #[test]
        fn other_bits_untouched(initial in any::<u32>(), bit in 0u32..32, value in any::<bool>()) {
            let mut flags = Flags32::from_bits(initial);
            flags.set_to(bit, value);

            let mask = !(1u32 << bit);
            prop_assert_eq!(flags.bits() & mask, initial & mask);
            for other in (0..32).filter(|&other| other != bit) {
                prop_assert_eq!(flags.get(other), initial & (1 << other) != 0);
            }
        }
    }
}
