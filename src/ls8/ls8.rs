// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::log;
use ls8::cpu::CPU;
use ls8::error::VMResult;
use ls8::memory::Memory;
use std::io::Write;

/// Options passed from the command-line that affect how the machine runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LS8RuntimeOptions {
    // Log every executed instruction.
    pub verbose: bool,

    // Drive the machine from the interactive debugger.
    pub debug: bool,
}

/// A complete LS-8 machine. It's created once per program run and thrown
/// away afterwards.
pub struct LS8 {
    pub runtime_options: LS8RuntimeOptions,
    pub cpu: CPU,
    pub memory: Memory,
}

impl LS8 {
    pub fn new(runtime_options: LS8RuntimeOptions) -> LS8 {
        LS8 {
            runtime_options: runtime_options,
            cpu: CPU::new(runtime_options),
            memory: Memory::new(),
        }
    }

    /// Places a program image at the start of memory.
    pub fn load(&mut self, program: &[u8]) -> VMResult<()> {
        self.memory.load_program(program)?;
        log::log("ls8", format!("Loaded {} byte program", program.len()), &self.runtime_options);
        Ok(())
    }

    #[inline(always)]
    pub fn halted(&self) -> bool {
        self.cpu.halted
    }

    /// Executes a single instruction. Does nothing once the machine halted.
    pub fn step<W: Write>(&mut self, out: &mut W) -> VMResult<()> {
        self.cpu.execute(&mut self.memory, out)
    }

    /// Runs the machine until it halts or faults. A program that never halts
    /// runs forever.
    pub fn run<W: Write>(&mut self, out: &mut W) -> VMResult<()> {
        while !self.cpu.halted {
            self.step(out)?;
        }
        Ok(())
    }
}
