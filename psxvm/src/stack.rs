//! Values allocated on the emulated stack.
//!
//! Translated code expects locals whose address it takes to live in emulated RAM, on the same stack
//! its own frames use. A [`VmSVal`] reserves room for a value by moving `SP` down, keeps the value
//! inside of the arena while it's alive and moves `SP` back up when dropped.
//!
//! Since a [`VmSVal`] holds the only mutable borrow of the [`Vm`], nested values must be created
//! through [`VmSVal::vm_mut`] and are therefore always dropped before their parent: the borrow
//! checker enforces the stack discipline.

use crate::{
    Vm,
    mem::{Address, Region, VmValue},
    ptr::VmPtr,
    util::fatal,
};
use log::trace;
use std::{
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::{Deref, DerefMut, Range},
};

/// A `T` living on the emulated stack.
pub struct VmSVal<'vm, T: VmValue> {
    vm: &'vm mut Vm,
    offset: u32,
    _value: PhantomData<T>,
}

impl<'vm, T: VmValue> VmSVal<'vm, T> {
    /// How much the stack pointer moves for a `T`: its size rounded up to a word.
    pub const STACK_SIZE: u32 = (size_of::<T>() as u32).next_multiple_of(4);

    /// Pushes `value` onto the emulated stack.
    ///
    /// A stack that overflows the RAM or ends up misaligned for `T` is fatal.
    #[track_caller]
    pub fn new(vm: &'vm mut Vm, value: T) -> Self {
        const { assert!(align_of::<T>() <= 4, "stack values must be at most word aligned") };

        let sp = vm.regs().sp().wrapping_sub(Self::STACK_SIZE);
        vm.regs_mut().set_sp(sp);

        let ram_len = vm.memory().ram_len();
        let offset = Address(sp).wrapped(ram_len);
        if u64::from(offset) + size_of::<T>() as u64 > u64::from(ram_len) {
            fatal(format_args!(
                "stack overflow: {} bytes at {} spill past the end of RAM",
                size_of::<T>(),
                Address(sp)
            ));
        }

        if let Err(e) = Address(sp).check_aligned(align_of::<T>() as u32) {
            fatal(format_args!("{e}"));
        }

        // the arena owns the value from now on
        let value = ManuallyDrop::new(value);
        let range = offset as usize..offset as usize + size_of::<T>();
        vm.memory_mut().bytes_mut(Region::Ram)[range].copy_from_slice(value.as_bytes());

        trace!(
            target: "psxvm::stack",
            "pushed {} ({} bytes) at {}",
            std::any::type_name::<T>(),
            Self::STACK_SIZE,
            Address(sp)
        );

        Self {
            vm,
            offset,
            _value: PhantomData,
        }
    }

    #[inline(always)]
    fn range(&self) -> Range<usize> {
        self.offset as usize..self.offset as usize + size_of::<T>()
    }

    /// The address of this value, relative to the start of RAM.
    #[inline(always)]
    pub fn addr(&self) -> u32 {
        self.offset
    }

    /// A pointer to this value, for handing to translated code.
    #[inline(always)]
    pub fn ptr(&self) -> VmPtr<T> {
        VmPtr::new(Address::ram(self.offset))
    }

    #[inline(always)]
    pub fn get(&self) -> &T {
        let range = self.range();
        match T::ref_from_bytes(&self.vm.memory().bytes(Region::Ram)[range]) {
            Ok(value) => value,
            Err(_) => unreachable!("stack values are bounds and alignment checked on push"),
        }
    }

    #[inline(always)]
    pub fn get_mut(&mut self) -> &mut T {
        let range = self.range();
        match T::mut_from_bytes(&mut self.vm.memory_mut().bytes_mut(Region::Ram)[range]) {
            Ok(value) => value,
            Err(_) => unreachable!("stack values are bounds and alignment checked on push"),
        }
    }

    /// The VM this value lives in.
    #[inline(always)]
    pub fn vm(&self) -> &Vm {
        &*self.vm
    }

    /// The VM this value lives in, mutably. Values pushed through it are popped before this one.
    #[inline(always)]
    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut *self.vm
    }

    /// Pops this value off of the stack and returns it.
    pub fn into_inner(self) -> T {
        let value = match T::read_from_bytes(&self.vm.memory().bytes(Region::Ram)[self.range()]) {
            Ok(value) => value,
            Err(_) => unreachable!("stack values are bounds checked on push"),
        };

        let mut this = ManuallyDrop::new(self);
        this.pop();

        value
    }

    fn pop(&mut self) {
        let sp = self.vm.regs().sp().wrapping_add(Self::STACK_SIZE);
        self.vm.regs_mut().set_sp(sp);

        trace!(
            target: "psxvm::stack",
            "popped {} ({} bytes), SP back at {}",
            std::any::type_name::<T>(),
            Self::STACK_SIZE,
            Address(sp)
        );
    }
}

impl<T: VmValue> Drop for VmSVal<'_, T> {
    fn drop(&mut self) {
        if std::mem::needs_drop::<T>() {
            match T::read_from_bytes(&self.vm.memory().bytes(Region::Ram)[self.range()]) {
                Ok(value) => drop(value),
                Err(_) => unreachable!("stack values are bounds checked on push"),
            }
        }

        self.pop();
    }
}

impl<T: VmValue> Deref for VmSVal<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.get()
    }
}

impl<T: VmValue> DerefMut for VmSVal<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.get_mut()
    }
}

impl<T: VmValue + std::fmt::Debug> std::fmt::Debug for VmSVal<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmSVal")
            .field("addr", &Address(self.offset))
            .field("value", self.get())
            .finish()
    }
}
