//! Items related to the emulated memory of the PSX.
//!
//! The memory is a byte arena: RAM plus the scratchpad. Translated code never sees host pointers,
//! only virtual [`Address`]es which are resolved into the arena on demand. Typed views of the
//! arena are produced with [`zerocopy`], never with pointer casts.

mod primitive;

use crate::util::fatal;
use easyerr::Error;
use std::ops::Range;
use strum::Display;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub use primitive::Primitive;

/// Default length of the main RAM, in bytes.
pub const DEFAULT_RAM_LEN: u32 = 2 * bytesize::MIB as u32;
/// Length of the scratchpad, in bytes.
pub const SCRATCHPAD_LEN: u32 = bytesize::KIB as u32;

const SCRATCHPAD_WORDS: usize = SCRATCHPAD_LEN as usize / size_of::<u64>();

/// A value that can live inside the emulated memory: plain data which can be viewed from and
/// written as raw bytes.
pub trait VmValue: FromBytes + IntoBytes + KnownLayout + Immutable {}

impl<T> VmValue for T where T: FromBytes + IntoBytes + KnownLayout + Immutable {}

/// A memory segment refers to a specific range of memory addresses, each with it's own purpose and
/// properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Kernel User SEGment. A mirror of the physical memory in the first 512MiB.
    KUSEG,
    /// Kernel SEGment 0. Cached view of the physical memory, where translated code keeps its
    /// pointers.
    KSEG0,
    /// Kernel SEGment 1. Uncached view of the physical memory.
    KSEG1,
    /// Kernel SEGment 2. Memory mapped CPU control registers.
    KSEG2,
}

impl Segment {
    #[inline(always)]
    pub const fn start(&self) -> Address {
        match self {
            Segment::KUSEG => Address(0x0000_0000),
            Segment::KSEG0 => Address(0x8000_0000),
            Segment::KSEG1 => Address(0xA000_0000),
            Segment::KSEG2 => Address(0xC000_0000),
        }
    }
}

/// A region of the memory arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Region {
    #[strum(to_string = "RAM")]
    Ram,
    #[strum(to_string = "the scratchpad")]
    ScratchPad,
}

impl Region {
    /// The physical address at which this region starts.
    #[inline(always)]
    pub const fn start(&self) -> Address {
        match self {
            Region::Ram => Address(0x0000_0000),
            Region::ScratchPad => Address(0x1F80_0000),
        }
    }
}

/// A virtual memory address. This is a thin wrapper around a [`u32`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Address(pub u32);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "0x{:04X}_{:04X}",
            (self.0 & 0xFFFF_0000) >> 16,
            self.0 & 0xFFFF
        )
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Address {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Returns the KSEG0 address of the given offset into RAM.
    #[inline(always)]
    pub const fn ram(offset: u32) -> Self {
        Self(Segment::KSEG0.start().0 | offset)
    }

    /// Returns the value of this address. Equivalent to `self.0`.
    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this address is null.
    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this address is aligned to the given alignment.
    #[inline(always)]
    pub const fn is_aligned(self, alignment: u32) -> bool {
        self.0 % alignment == 0
    }

    /// Returns an error if this address is not aligned to the given alignment.
    #[inline(always)]
    pub const fn check_aligned(self, alignment: u32) -> Result<(), MisalignedAddressErr> {
        if self.is_aligned(alignment) {
            Ok(())
        } else {
            Err(MisalignedAddressErr {
                addr: self,
                alignment,
            })
        }
    }

    /// Returns the segment of this address.
    #[inline(always)]
    pub const fn segment(self) -> Segment {
        match self.0 {
            0x0000_0000..=0x7FFF_FFFF => Segment::KUSEG,
            0x8000_0000..=0x9FFF_FFFF => Segment::KSEG0,
            0xA000_0000..=0xBFFF_FFFF => Segment::KSEG1,
            0xC000_0000..=0xFFFF_FFFF => Segment::KSEG2,
        }
    }

    /// Returns the physical part of this address, i.e. the address with its segment bits
    /// stripped.
    #[inline(always)]
    pub const fn physical(self) -> u32 {
        self.0 & 0x1FFF_FFFF
    }

    /// Returns the offset into a RAM of `ram_len` bytes (a power of two) this address maps to.
    /// Every bit above the RAM size is ignored, so mirrors and segments all wrap to the same
    /// location.
    #[inline(always)]
    pub const fn wrapped(self, ram_len: u32) -> u32 {
        self.0 & (ram_len - 1)
    }

    /// Returns the offset into the scratchpad this address maps to, if it's inside of it. The
    /// address one past the end is included.
    #[inline(always)]
    pub const fn scratchpad_offset(self) -> Option<u32> {
        let start = Region::ScratchPad.start().0;
        match self.physical() {
            phys @ 0x1F80_0000..=0x1F80_0400 => Some(phys - start),
            _ => None,
        }
    }
}

impl std::ops::Add<u32> for Address {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        Self(self.0.wrapping_add(rhs))
    }
}

impl std::ops::Add<i32> for Address {
    type Output = Self;

    fn add(self, rhs: i32) -> Self::Output {
        Self(self.0.wrapping_add_signed(rhs))
    }
}

impl std::ops::Sub<u32> for Address {
    type Output = Self;

    fn sub(self, rhs: u32) -> Self::Output {
        Self(self.0.wrapping_sub(rhs))
    }
}

impl std::ops::Sub<i32> for Address {
    type Output = Self;

    fn sub(self, rhs: i32) -> Self::Output {
        Self(self.0.wrapping_add_signed(rhs.wrapping_neg()))
    }
}

impl PartialEq<u32> for Address {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("address {addr} is misaligned (expected alignment of {alignment})")]
pub struct MisalignedAddressErr {
    pub addr: Address,
    pub alignment: u32,
}

#[derive(Debug, Clone, Copy, Error)]
#[error("{size} bytes at {addr} spill past the end of {region}")]
pub struct OutOfBoundsErr {
    pub addr: Address,
    pub size: u32,
    pub region: Region,
}

/// The location in the arena an address resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub region: Region,
    /// Byte range inside of the region.
    pub range: Range<usize>,
}

/// The memory arena: main RAM and the scratchpad.
///
/// Both regions are stored as 64-bit words so that the arena is 8-byte aligned. Since wrapping
/// preserves the low bits of an address, an aligned address always resolves to an equally
/// aligned location.
pub struct Memory {
    ram: Box<[u64]>,
    ram_len: u32,
    scratchpad: Box<[u64; SCRATCHPAD_WORDS]>,
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("ram_len", &bytesize::ByteSize(u64::from(self.ram_len)))
            .finish_non_exhaustive()
    }
}

impl Memory {
    /// Creates a new [`Memory`] with zeroed contents and `ram_len` bytes of RAM. `ram_len` must be
    /// a power of two multiple of 8, which [`Config`](crate::Config) validation guarantees.
    pub(crate) fn new(ram_len: u32) -> Self {
        debug_assert!(ram_len.is_power_of_two() && ram_len >= 8);

        Self {
            ram: vec![0; ram_len as usize / size_of::<u64>()].into_boxed_slice(),
            ram_len,
            scratchpad: Box::new([0; SCRATCHPAD_WORDS]),
        }
    }

    /// The length of the RAM, in bytes.
    #[inline(always)]
    pub fn ram_len(&self) -> u32 {
        self.ram_len
    }

    /// The length of the given region, in bytes.
    #[inline(always)]
    pub fn len(&self, region: Region) -> u32 {
        match region {
            Region::Ram => self.ram_len,
            Region::ScratchPad => SCRATCHPAD_LEN,
        }
    }

    /// The contents of the given region.
    #[inline(always)]
    pub fn bytes(&self, region: Region) -> &[u8] {
        match region {
            Region::Ram => self.ram.as_bytes(),
            Region::ScratchPad => self.scratchpad.as_bytes(),
        }
    }

    /// The contents of the given region, mutably.
    #[inline(always)]
    pub fn bytes_mut(&mut self, region: Region) -> &mut [u8] {
        match region {
            Region::Ram => self.ram.as_mut_bytes(),
            Region::ScratchPad => self.scratchpad.as_mut_bytes(),
        }
    }

    /// Resolves `size` bytes at `addr` into the arena.
    ///
    /// Scratchpad addresses map to the scratchpad, everything else wraps into RAM. The whole range
    /// must fit inside of the region it starts in.
    pub fn resolve(&self, addr: Address, size: u32) -> Result<Location, OutOfBoundsErr> {
        let (region, offset) = match addr.scratchpad_offset() {
            Some(offset) => (Region::ScratchPad, offset),
            None => (Region::Ram, addr.wrapped(self.ram_len)),
        };

        let end = u64::from(offset) + u64::from(size);
        if end > u64::from(self.len(region)) {
            return Err(OutOfBoundsErr { addr, size, region });
        }

        Ok(Location {
            region,
            range: offset as usize..end as usize,
        })
    }

    /// Resolves the location of element `index` of an array of `T` starting at `base`.
    /// Misaligned or out of bounds elements are fatal.
    ///
    /// Only `base` is wrapped: the whole span up to and including the element must fit in the
    /// region `base` resolves to.
    #[track_caller]
    fn locate<T>(&self, base: Address, index: u32) -> Location {
        const { assert!(align_of::<T>() <= 8, "the arena is only 8-byte aligned") };

        if let Err(e) = base.check_aligned(align_of::<T>() as u32) {
            fatal(format_args!("{e}"));
        }

        let size = size_of::<T>();
        let span = (index as usize + 1).saturating_mul(size);
        let span = u32::try_from(span).unwrap_or(u32::MAX);

        match self.resolve(base, span) {
            Ok(Location { region, range }) => Location {
                region,
                range: range.end - size..range.end,
            },
            Err(e) => fatal(format_args!("{e}")),
        }
    }

    /// Returns a reference to the `T` at `addr`.
    ///
    /// Misaligned addresses and values spilling past the end of their region are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn get<T: VmValue>(&self, addr: Address) -> &T {
        self.element(addr, 0)
    }

    /// Returns a mutable reference to the `T` at `addr`.
    ///
    /// Misaligned addresses and values spilling past the end of their region are fatal.
    #[inline(always)]
    #[track_caller]
    pub fn get_mut<T: VmValue>(&mut self, addr: Address) -> &mut T {
        self.element_mut(addr, 0)
    }

    /// Returns a reference to element `index` of the array of `T` starting at `base`.
    ///
    /// Misaligned arrays and elements spilling past the end of the region are fatal.
    #[track_caller]
    pub fn element<T: VmValue>(&self, base: Address, index: u32) -> &T {
        let Location { region, range } = self.locate::<T>(base, index);
        match T::ref_from_bytes(&self.bytes(region)[range]) {
            Ok(value) => value,
            Err(_) => unreachable!("locations are bounds and alignment checked"),
        }
    }

    /// Returns a mutable reference to element `index` of the array of `T` starting at `base`.
    ///
    /// Misaligned arrays and elements spilling past the end of the region are fatal.
    #[track_caller]
    pub fn element_mut<T: VmValue>(&mut self, base: Address, index: u32) -> &mut T {
        let Location { region, range } = self.locate::<T>(base, index);
        match T::mut_from_bytes(&mut self.bytes_mut(region)[range]) {
            Ok(value) => value,
            Err(_) => unreachable!("locations are bounds and alignment checked"),
        }
    }

    /// Reads a primitive at `addr`, as a load instruction would.
    ///
    /// Out of bounds addresses are fatal.
    #[track_caller]
    pub fn read<P: Primitive>(&self, addr: Address) -> Result<P, MisalignedAddressErr> {
        addr.check_aligned(P::ALIGNMENT)?;

        let Location { region, range } = match self.resolve(addr, size_of::<P>() as u32) {
            Ok(location) => location,
            Err(e) => fatal(format_args!("{e}")),
        };

        Ok(P::read_from(&self.bytes(region)[range]))
    }

    /// Writes a primitive at `addr`, as a store instruction would.
    ///
    /// Out of bounds addresses are fatal.
    #[track_caller]
    pub fn write<P: Primitive>(
        &mut self,
        addr: Address,
        value: P,
    ) -> Result<(), MisalignedAddressErr> {
        addr.check_aligned(P::ALIGNMENT)?;

        let Location { region, range } = match self.resolve(addr, size_of::<P>() as u32) {
            Ok(location) => location,
            Err(e) => fatal(format_args!("{e}")),
        };

        value.write_to(&mut self.bytes_mut(region)[range]);
        Ok(())
    }
}
