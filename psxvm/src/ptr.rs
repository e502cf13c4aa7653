//! Typed pointers into the emulated memory.

use crate::{
    mem::{Address, Memory, VmValue},
    util::fatal,
};
use std::marker::PhantomData;

/// A 32-bit pointer to a `T` inside of the emulated memory.
///
/// A [`VmPtr`] is just an [`Address`] tagged with a pointee type: it's the same size on every host
/// and stays valid no matter where the arena lives. It's resolved into a reference only when
/// given the [`Memory`] it points into. Arithmetic is done in units of `T`, like it would on a
/// native pointer, and wraps around the 32-bit address space.
#[repr(transparent)]
pub struct VmPtr<T> {
    addr: Address,
    _pointee: PhantomData<fn() -> T>,
}

impl<T> Clone for VmPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for VmPtr<T> {}

impl<T> PartialEq for VmPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for VmPtr<T> {}

impl<T> PartialOrd for VmPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for VmPtr<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.addr.cmp(&other.addr)
    }
}

impl<T> std::hash::Hash for VmPtr<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl<T> std::fmt::Debug for VmPtr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VmPtr<{}>({})", std::any::type_name::<T>(), self.addr)
    }
}

impl<T> Default for VmPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<VmPtr<T>> for Address {
    fn from(value: VmPtr<T>) -> Self {
        value.addr
    }
}

impl<T> VmPtr<T> {
    /// Size of the pointee, i.e. the stride of pointer arithmetic.
    const STRIDE: u32 = size_of::<T>() as u32;

    /// The null pointer.
    #[inline(always)]
    pub const fn null() -> Self {
        Self::new(Address::NULL)
    }

    #[inline(always)]
    pub const fn new(addr: Address) -> Self {
        Self {
            addr,
            _pointee: PhantomData,
        }
    }

    /// The address this pointer points to.
    #[inline(always)]
    pub const fn addr(self) -> Address {
        self.addr
    }

    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.addr.is_null()
    }

    /// Offsets this pointer by `count` elements, which may be negative.
    #[inline(always)]
    pub fn offset(self, count: i32) -> Self {
        Self::new(self.addr + count.wrapping_mul(Self::STRIDE as i32))
    }

    /// Reinterprets this pointer as pointing to a `U`.
    #[inline(always)]
    pub const fn cast<U>(self) -> VmPtr<U> {
        VmPtr::new(self.addr)
    }

    /// The distance between `origin` and this pointer, in elements.
    #[inline(always)]
    pub fn offset_from(self, origin: Self) -> i32 {
        let bytes = self.addr.value().wrapping_sub(origin.addr.value()) as i32;
        bytes / Self::STRIDE.max(1) as i32
    }
}

impl<T: VmValue> VmPtr<T> {
    /// Resolves this pointer into a reference, or [`None`] if it's null.
    ///
    /// Misaligned pointers and pointees spilling past the end of memory are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn get(self, memory: &Memory) -> Option<&T> {
        if self.is_null() {
            None
        } else {
            Some(memory.get(self.addr))
        }
    }

    /// Resolves this pointer into a mutable reference, or [`None`] if it's null.
    ///
    /// Misaligned pointers and pointees spilling past the end of memory are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn get_mut(self, memory: &mut Memory) -> Option<&mut T> {
        if self.is_null() {
            None
        } else {
            Some(memory.get_mut(self.addr))
        }
    }

    /// Returns a reference to the element `index` elements after the one this pointer points to.
    /// Null pointers are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn index(self, memory: &Memory, index: u32) -> &T {
        if self.is_null() {
            fatal(format_args!("indexing a null {self:?}"));
        }

        memory.element(self.addr, index)
    }

    /// Returns a mutable reference to the element `index` elements after the one this pointer
    /// points to. Null pointers are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn index_mut(self, memory: &mut Memory, index: u32) -> &mut T {
        if self.is_null() {
            fatal(format_args!("indexing a null {self:?}"));
        }

        memory.element_mut(self.addr, index)
    }
}

impl<T: VmValue + Copy> VmPtr<T> {
    /// Reads the pointee, or returns [`None`] if this pointer is null.
    #[inline(always)]
    #[track_caller]
    pub fn read(self, memory: &Memory) -> Option<T> {
        self.get(memory).copied()
    }

    /// Writes the pointee. Null pointers are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn write(self, memory: &mut Memory, value: T) {
        *self.index_mut(memory, 0) = value;
    }
}

impl<T> std::ops::Add<u32> for VmPtr<T> {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self::new(self.addr + rhs.wrapping_mul(Self::STRIDE))
    }
}

impl<T> std::ops::Sub<u32> for VmPtr<T> {
    type Output = Self;

    fn sub(self, rhs: u32) -> Self::Output {
        Self::new(self.addr - rhs.wrapping_mul(Self::STRIDE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mem::DEFAULT_RAM_LEN;
    use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

    #[repr(C)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
    struct Vertex {
        x: i16,
        y: i16,
        z: i32,
    }

    #[test]
    fn null_resolves_to_none() {
        let memory = Memory::new(DEFAULT_RAM_LEN);
        let ptr = VmPtr::<u32>::null();

        assert!(ptr.is_null());
        assert_eq!(ptr.get(&memory), None);
        assert_eq!(ptr.read(&memory), None);
        assert_eq!(VmPtr::<u32>::default(), ptr);
    }

    #[test]
    fn arithmetic_is_in_elements() {
        let ptr = VmPtr::<Vertex>::new(Address(0x8000_1000));

        assert_eq!((ptr + 2).addr(), Address(0x8000_1010));
        assert_eq!((ptr - 1).addr(), Address(0x8000_0FF8));
        assert_eq!(ptr.offset(-2).addr(), Address(0x8000_0FF0));
        assert_eq!((ptr + 5).offset_from(ptr), 5);
        assert_eq!(ptr.offset_from(ptr + 5), -5);
        assert!(ptr < ptr + 1);
    }

    #[test]
    fn structs_in_memory() {
        let mut memory = Memory::new(DEFAULT_RAM_LEN);
        let ptr = VmPtr::<Vertex>::new(Address(0x8000_2000));

        ptr.write(&mut memory, Vertex { x: -1, y: 2, z: 3 });
        (ptr + 1).write(&mut memory, Vertex { x: 4, y: 5, z: -6 });

        assert_eq!(ptr.index(&memory, 1), &Vertex { x: 4, y: 5, z: -6 });
        assert_eq!(memory.read::<u16>(Address(0x8000_2000)).unwrap(), 0xFFFF);

        // the same memory, through a mirror and a cast
        let mirror = VmPtr::<Vertex>::new(Address(0x0020_2000));
        assert_eq!(mirror.read(&memory), Some(Vertex { x: -1, y: 2, z: 3 }));
        assert_eq!(ptr.cast::<i32>().index(&memory, 3), &-6);

        ptr.index_mut(&mut memory, 1).z = 10;
        assert_eq!((ptr + 1).read(&memory).map(|v| v.z), Some(10));
    }

    #[test]
    #[should_panic(expected = "spill past the end of RAM")]
    fn index_past_ram_is_fatal() {
        let memory = Memory::new(DEFAULT_RAM_LEN);
        let ptr = VmPtr::<u32>::new(Address(0x801F_FFF8));
        ptr.index(&memory, 1);
        ptr.index(&memory, 2);
    }

    #[test]
    #[should_panic(expected = "null")]
    fn writing_through_null_is_fatal() {
        let mut memory = Memory::new(DEFAULT_RAM_LEN);
        VmPtr::<u32>::null().write(&mut memory, 1);
    }
}
