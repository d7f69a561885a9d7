// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::log;
use ls8::error::{VMError, VMResult};
use ls8::instruction::{Flow, Instruction};
use ls8::ls8::LS8RuntimeOptions;
use ls8::memory::Memory;
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;

pub const REGISTER_COUNT: usize = 8;

// Register 7 is reserved as the stack pointer.
pub const SP: usize = 7;

// Address the stack pointer holds on power up. The stack grows downwards from
// here, leaving the bytes above it free for the program.
pub const STACK_START: u8 = 0xF4;

// Flag constants that allow easy bitwise getting and setting of flag values.
// The flag register is laid out as 00000LGE.
pub const EQUAL_FLAG       : u8 = 0x1;
pub const GREATER_THAN_FLAG: u8 = 0x2;
pub const LESS_THAN_FLAG   : u8 = 0x4;

/// The LS-8 processor: eight general purpose 8-bit registers, a program
/// counter and a flag register. Memory is kept separately and handed to the
/// CPU on every cycle.
pub struct CPU {
    // General purpose registers R0 through R7. R7 doubles as the stack pointer
    // and is only moved by PUSH, POP, CALL and RET.
    pub reg: [u8; REGISTER_COUNT],

    // Address of the next instruction to fetch. It advances by the width of
    // the executed instruction unless that instruction transferred control.
    pub pc: u8,

    // Result of the most recent CMP. Exactly one of L, G and E is set after a
    // compare and stays set until the next compare.
    pub fl: u8,

    // Set by HLT. Once halted the CPU never fetches again.
    pub halted: bool,

    // Number of instructions executed so far.
    pub cycles: u64,

    // Options passed from the command-line that may influence how the CPU
    // behaves.
    runtime_options: LS8RuntimeOptions,
}

impl CPU {
    pub fn new(runtime_options: LS8RuntimeOptions) -> CPU {
        let mut reg = [0; REGISTER_COUNT];
        reg[SP] = STACK_START;

        CPU {
            reg: reg,
            pc: 0,
            fl: 0,
            halted: false,
            cycles: 0,
            runtime_options: runtime_options,
        }
    }

    /// Reads a general purpose register named by an operand byte.
    #[inline(always)]
    pub fn read_reg(&self, index: u8) -> VMResult<u8> {
        match self.reg.get(index as usize) {
            Some(val) => Ok(*val),
            None => Err(VMError::InvalidRegister { pc: self.pc, index: index }),
        }
    }

    /// Writes a general purpose register named by an operand byte.
    #[inline(always)]
    pub fn write_reg(&mut self, index: u8, val: u8) -> VMResult<()> {
        let pc = self.pc;
        match self.reg.get_mut(index as usize) {
            Some(cell) => {
                *cell = val;
                Ok(())
            },
            None => Err(VMError::InvalidRegister { pc: pc, index: index }),
        }
    }

    /// Clears all compare flags and sets the single one matching the ordering
    /// of the left operand against the right one.
    pub fn set_compare_flags(&mut self, ordering: Ordering) {
        self.fl = match ordering {
            Ordering::Equal => EQUAL_FLAG,
            Ordering::Greater => GREATER_THAN_FLAG,
            Ordering::Less => LESS_THAN_FLAG,
        };
    }

    #[inline(always)]
    pub fn equal_flag_set(&self) -> bool {
        self.fl & EQUAL_FLAG == EQUAL_FLAG
    }

    #[inline(always)]
    pub fn greater_than_flag_set(&self) -> bool {
        self.fl & GREATER_THAN_FLAG == GREATER_THAN_FLAG
    }

    #[inline(always)]
    pub fn less_than_flag_set(&self) -> bool {
        self.fl & LESS_THAN_FLAG == LESS_THAN_FLAG
    }

    /// Runs a single fetch, decode and execute cycle against the given memory.
    /// Output produced by PRN is written to `out`.
    ///
    /// Nothing about the machine changes if the fetched instruction faults,
    /// so the crash state reflects the instruction that failed. That includes
    /// an instruction in the last bytes of memory that would advance the
    /// program counter past 0xFF.
    pub fn execute<W: Write>(&mut self, memory: &mut Memory, out: &mut W) -> VMResult<()> {
        if self.halted {
            return Ok(());
        }

        let instr = Instruction::parse(self.pc, memory)?;
        if self.runtime_options.verbose {
            log::log("cpu", instr.log(self), &self.runtime_options);
        }

        let next = self.pc as usize + instr.len();
        if next > u8::max_value() as usize && instr.falls_through(self) {
            return Err(VMError::AddressOutOfRange { pc: self.pc, address: next });
        }

        let flow = instr.execute(self, memory, out)?;
        self.cycles += 1;

        match flow {
            // Only reachable when the range check above passed.
            Flow::Advance => self.pc = next as u8,
            Flow::Jump(addr) => self.pc = addr,
            Flow::Halt => {
                self.halted = true;
                log::log("cpu", format!("Halted at {:#04X}", self.pc), &self.runtime_options);
            },
        }

        Ok(())
    }

    /// Returns "SET" if the passed boolean is true, otherwise "UNSET". This
    /// function is used to display flags when the CPU crashes.
    fn fmt_flag(flag: bool) -> &'static str {
        if flag { "SET" } else { "UNSET" }
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "CPU State:")?;
        writeln!(f, "    Program Counter: {:#04X}", self.pc)?;
        writeln!(f, "    Stack Pointer:   {:#04X}", self.reg[SP])?;
        writeln!(f, "    Cycles:          {}", self.cycles)?;
        for (i, val) in self.reg.iter().enumerate() {
            writeln!(f, "    R{}:              {:#04X}", i, val)?;
        }
        writeln!(f, "")?;
        writeln!(f, "Flag Register: {:#010b}", self.fl)?;
        writeln!(f, "    Less Than:    {}", CPU::fmt_flag(self.less_than_flag_set()))?;
        writeln!(f, "    Greater Than: {}", CPU::fmt_flag(self.greater_than_flag_set()))?;
        write!(f, "    Equal:        {}", CPU::fmt_flag(self.equal_flag_set()))
    }
}
