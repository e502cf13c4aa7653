//! Main crate of the psxvm memory model. This crate is responsible for the environment translated
//! PSX code runs in: an arena standing in for the emulated RAM, the CPU registers shared with the
//! runtime and typed access to values living inside of the arena.
//!
//! Game side helpers which don't touch the emulated memory (fixed point math, flags, index sets)
//! live in [`psxvm_core`], re-exported as [`core`].

pub mod cpu;
pub mod mem;
pub mod ptr;
pub mod stack;
mod util;

use cpu::Registers;
use easyerr::Error;
use log::info;
use mem::{Address, DEFAULT_RAM_LEN, Memory, VmValue};

pub use psxvm_core as core;
pub use ptr::VmPtr;
pub use stack::VmSVal;

/// VM configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of the main RAM, in bytes. Must be a power of two multiple of 8.
    pub ram_size: u32,
    /// Initial value of the stack pointer.
    pub initial_sp: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ram_size: DEFAULT_RAM_LEN,
            initial_sp: Address::ram(DEFAULT_RAM_LEN).value(),
        }
    }
}

#[derive(Debug, Clone, Copy, Error)]
#[error("RAM size of {size} bytes is not a power of two multiple of 8")]
pub struct InvalidRamSizeErr {
    pub size: u32,
}

/// The state translated code runs against.
#[derive(Debug)]
pub struct Vm {
    memory: Memory,
    regs: Registers,
}

impl Vm {
    /// Creates a new [`Vm`] with zeroed memory.
    pub fn new(config: Config) -> Result<Self, InvalidRamSizeErr> {
        if !config.ram_size.is_power_of_two() || config.ram_size < 8 {
            return Err(InvalidRamSizeErr {
                size: config.ram_size,
            });
        }

        let mut regs = Registers::default();
        regs.set_sp(config.initial_sp);

        info!(
            target: "psxvm::vm",
            "created VM with {} of RAM, SP at {}",
            bytesize::ByteSize(u64::from(config.ram_size)),
            Address(config.initial_sp)
        );

        Ok(Self {
            memory: Memory::new(config.ram_size),
            regs,
        })
    }

    #[inline(always)]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline(always)]
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    #[inline(always)]
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    #[inline(always)]
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// The current stack pointer.
    #[inline(always)]
    pub fn sp(&self) -> u32 {
        self.regs.sp()
    }

    /// Pushes `value` onto the emulated stack. Shorthand for [`VmSVal::new`].
    #[inline(always)]
    #[track_caller]
    pub fn push<T: VmValue>(&mut self, value: T) -> VmSVal<'_, T> {
        VmSVal::new(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Clock, Fixed, FixedIndexSet, InterpFixed};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn default_config() {
        init_logger();

        let vm = Vm::new(Config::default()).unwrap();
        assert_eq!(vm.memory().ram_len(), 0x20_0000);
        assert_eq!(vm.sp(), 0x8020_0000);
    }

    #[test]
    fn invalid_ram_sizes() {
        init_logger();

        for size in [0, 4, 3 * 1024, 0x20_0001] {
            let err = Vm::new(Config {
                ram_size: size,
                initial_sp: 0,
            })
            .unwrap_err();
            assert_eq!(err.size, size);
        }

        assert!(
            Vm::new(Config {
                ram_size: 8,
                initial_sp: 8,
            })
            .is_ok()
        );
    }

    #[test]
    fn end_to_end() {
        init_logger();

        let mut vm = Vm::new(Config {
            ram_size: 0x20_0000,
            initial_sp: 0x20_0000,
        })
        .unwrap();

        {
            let val = VmSVal::new(&mut vm, 42i32);
            assert_eq!(val.vm().sp(), 0x1F_FFFC);
            assert_eq!(val.addr(), 0x1F_FFFC);
            assert_eq!(*val, 42);
        }

        assert_eq!(vm.sp(), 0x20_0000);
    }

    #[test]
    fn game_state_in_vm_memory() {
        init_logger();

        let mut vm = Vm::new(Config::default()).unwrap();
        let mut visible = FixedIndexSet::new(64);
        let mut height = InterpFixed::new(Fixed::ZERO);

        // translated code fills a buffer on the stack, the runtime reads it back
        let mut heights = vm.push([0i32; 4]);
        let ptr = heights.ptr().cast::<i32>();
        for i in 0..4u32 {
            *ptr.index_mut(heights.vm_mut().memory_mut(), i) = Fixed::from_int(i as i32 * 10).0;
        }

        for (i, &h) in heights.iter().enumerate() {
            if h > 0 {
                visible.add(i as u32);
            }
        }

        let clock = Clock {
            game_tic: 1,
            lerp_factor: Fixed::ONE,
        };
        height.set(Fixed(heights[3]), clock);
        drop(heights);

        assert_eq!(visible.iter().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(height.render_value(clock), Fixed::from_int(30));
        assert_eq!(vm.sp(), Config::default().initial_sp);
    }
}
