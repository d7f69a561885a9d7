// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ls8::cpu::{CPU, SP};
use ls8::error::{VMError, VMResult};

// The LS-8 has a single flat 256 byte address space shared by code, data and
// the stack.
pub const MEMORY_SIZE: usize = 0x100;

/// Raised by memory primitives when an address falls outside of RAM. The
/// caller attaches the program counter before reporting it.
#[derive(Debug, PartialEq)]
pub struct AddressOutOfRange(pub usize);

impl AddressOutOfRange {
    pub fn at(self, pc: u8) -> VMError {
        VMError::AddressOutOfRange { pc: pc, address: self.0 }
    }
}

/// Flat RAM of the machine. There is no memory mapping: every address in
/// [0x00, 0xFF] is plain storage and anything else is a fault.
pub struct Memory {
    ram: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            ram: [0; MEMORY_SIZE],
        }
    }

    /// Reads an unsigned 8-bit byte value located at the given address.
    #[inline(always)]
    pub fn read_u8(&self, addr: usize) -> Result<u8, AddressOutOfRange> {
        match self.ram.get(addr) {
            Some(val) => Ok(*val),
            None => Err(AddressOutOfRange(addr)),
        }
    }

    /// Writes an unsigned 8-bit byte value to the given address.
    #[inline(always)]
    pub fn write_u8(&mut self, addr: usize, val: u8) -> Result<(), AddressOutOfRange> {
        match self.ram.get_mut(addr) {
            Some(cell) => {
                *cell = val;
                Ok(())
            },
            None => Err(AddressOutOfRange(addr)),
        }
    }

    /// Copies a program image into memory starting at address 0. Images larger
    /// than memory are rejected before anything is written.
    pub fn load_program(&mut self, program: &[u8]) -> VMResult<()> {
        if program.len() > MEMORY_SIZE {
            return Err(VMError::ProgramTooLarge { len: program.len() });
        }
        self.ram[..program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Borrows `len` bytes starting at `addr`, clamped to the end of memory.
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        let start = addr.min(MEMORY_SIZE);
        let end = start.saturating_add(len).min(MEMORY_SIZE);
        &self.ram[start..end]
    }

    // Utility functions for managing the stack. The stack pointer lives in a
    // general purpose register and holds the address of the most recently
    // pushed byte; the stack grows downwards.

    /// Pushes an 8-bit number onto the stack.
    pub fn stack_push_u8(&mut self, cpu: &mut CPU, value: u8) -> VMResult<()> {
        let sp = match cpu.reg[SP].checked_sub(1) {
            Some(sp) => sp,
            None => return Err(VMError::StackOverflow { pc: cpu.pc }),
        };
        self.write_u8(sp as usize, value).map_err(|e| e.at(cpu.pc))?;
        cpu.reg[SP] = sp;
        Ok(())
    }

    /// Pops an 8-bit number off the stack.
    pub fn stack_pop_u8(&mut self, cpu: &mut CPU) -> VMResult<u8> {
        let sp = match cpu.reg[SP].checked_add(1) {
            Some(sp) => sp,
            None => return Err(VMError::StackUnderflow { pc: cpu.pc }),
        };
        let value = self.read_u8(cpu.reg[SP] as usize).map_err(|e| e.at(cpu.pc))?;
        cpu.reg[SP] = sp;
        Ok(value)
    }
}
