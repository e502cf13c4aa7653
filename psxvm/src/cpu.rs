//! The register file of the emulated R3000.
//!
//! Translated code does not go through an instruction interpreter, but it still shares the
//! general purpose registers with the runtime: most importantly `SP`, which stack values are
//! allocated from.

use strum::{FromRepr, VariantArray};

/// A general purpose register of the CPU.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, VariantArray)]
pub enum Reg {
    /// `R0`, the only register with a constant value: it always evaluates to zero.
    R0,
    /// `R1`, also called `AT`, the Assembler Temporary register.
    R1,
    /// `R2`, also called `V0`, used as a subroutine return value.
    R2,
    /// `R3`, also called `V1`, used as a subroutine return value.
    R3,
    /// `R4`, also called `A0`, used as a subroutine argument.
    R4,
    /// `R5`, also called `A1`, used as a subroutine argument.
    R5,
    /// `R6`, also called `A2`, used as a subroutine argument.
    R6,
    /// `R7`, also called `A3`, used as a subroutine argument.
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    R16,
    R17,
    R18,
    R19,
    R20,
    R21,
    R22,
    R23,
    R24,
    R25,
    /// `R26`, also called `K0`, reserved for the kernel.
    R26,
    /// `R27`, also called `K1`, reserved for the kernel.
    R27,
    /// `R28`, also called `GP`, a global pointer to some static data.
    R28,
    /// `R29`, also called `SP`, the stack pointer. It points to the top of the stack, which grows
    /// downwards.
    R29,
    /// `R30`, also called `FP`, the frame pointer.
    R30,
    /// `R31`, also called `RA`, the return address of the current subroutine.
    R31,
}

impl Reg {
    pub const ZERO: Reg = Reg::R0;
    pub const AT: Reg = Reg::R1;

    pub const V0: Reg = Reg::R2;
    pub const V1: Reg = Reg::R3;

    pub const A0: Reg = Reg::R4;
    pub const A1: Reg = Reg::R5;
    pub const A2: Reg = Reg::R6;
    pub const A3: Reg = Reg::R7;

    pub const T0: Reg = Reg::R8;
    pub const T1: Reg = Reg::R9;
    pub const T2: Reg = Reg::R10;
    pub const T3: Reg = Reg::R11;
    pub const T4: Reg = Reg::R12;
    pub const T5: Reg = Reg::R13;
    pub const T6: Reg = Reg::R14;
    pub const T7: Reg = Reg::R15;

    pub const S0: Reg = Reg::R16;
    pub const S1: Reg = Reg::R17;
    pub const S2: Reg = Reg::R18;
    pub const S3: Reg = Reg::R19;
    pub const S4: Reg = Reg::R20;
    pub const S5: Reg = Reg::R21;
    pub const S6: Reg = Reg::R22;
    pub const S7: Reg = Reg::R23;

    pub const T8: Reg = Reg::R24;
    pub const T9: Reg = Reg::R25;

    pub const K0: Reg = Reg::R26;
    pub const K1: Reg = Reg::R27;

    pub const GP: Reg = Reg::R28;
    pub const SP: Reg = Reg::R29;
    pub const FP: Reg = Reg::R30;
    pub const RA: Reg = Reg::R31;

    pub fn alt_name(&self) -> &'static str {
        match self {
            Reg::R0 => "00",
            Reg::R1 => "AT",
            Reg::R2 => "V0",
            Reg::R3 => "V1",
            Reg::R4 => "A0",
            Reg::R5 => "A1",
            Reg::R6 => "A2",
            Reg::R7 => "A3",
            Reg::R8 => "T0",
            Reg::R9 => "T1",
            Reg::R10 => "T2",
            Reg::R11 => "T3",
            Reg::R12 => "T4",
            Reg::R13 => "T5",
            Reg::R14 => "T6",
            Reg::R15 => "T7",
            Reg::R16 => "S0",
            Reg::R17 => "S1",
            Reg::R18 => "S2",
            Reg::R19 => "S3",
            Reg::R20 => "S4",
            Reg::R21 => "S5",
            Reg::R22 => "S6",
            Reg::R23 => "S7",
            Reg::R24 => "T8",
            Reg::R25 => "T9",
            Reg::R26 => "K0",
            Reg::R27 => "K1",
            Reg::R28 => "GP",
            Reg::R29 => "SP",
            Reg::R30 => "FP",
            Reg::R31 => "RA",
        }
    }
}

/// The general purpose registers of the CPU.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Registers {
    gp: [u32; 32],
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (reg, value) in Reg::VARIANTS.iter().zip(self.gp) {
            if value != 0 {
                map.entry(&reg.alt_name(), &format_args!("{value:#010X}"));
            }
        }

        map.finish_non_exhaustive()
    }
}

impl Registers {
    #[inline(always)]
    pub fn read(&self, reg: Reg) -> u32 {
        self.gp[reg as usize]
    }

    /// Writes to a register. Writes to `R0` are ignored.
    #[inline(always)]
    pub fn write(&mut self, reg: Reg, value: u32) {
        if reg != Reg::R0 {
            self.gp[reg as usize] = value;
        }
    }

    /// The stack pointer.
    #[inline(always)]
    pub fn sp(&self) -> u32 {
        self.read(Reg::SP)
    }

    #[inline(always)]
    pub fn set_sp(&mut self, value: u32) {
        self.write(Reg::SP, value);
    }
}
