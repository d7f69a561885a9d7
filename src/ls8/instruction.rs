// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ls8::alu::{self, AluOp};
use ls8::cpu::CPU;
use ls8::error::{VMError, VMResult};
use ls8::memory::Memory;
use ls8::opcode::{decode_opcode, opcode_len, operand_count, Opcode};
use std::io::Write;

/// What the CPU does with the program counter once an instruction finished.
#[derive(Debug, PartialEq)]
pub enum Flow {
    // Move past the instruction by its encoded width.
    Advance,
    // Control was transferred; the program counter is set to this address.
    Jump(u8),
    // The machine stops without touching the program counter.
    Halt,
}

/// LS-8 instructions are a maximum size of 3 bytes. The first byte is the
/// opcode which determines the action of the instruction. The following 2
/// bytes are the operands and are present depending on the opcode. Operands
/// that the encoding doesn't include are left as zero.
#[derive(Debug, PartialEq)]
pub struct Instruction(Opcode, u8, u8);

impl Instruction {
    /// Fetches and decodes the instruction at `pc`. The opcode is validated
    /// before any operand is read, and only as many operand bytes as the
    /// encoding declares are fetched.
    pub fn parse(pc: u8, memory: &Memory) -> VMResult<Instruction> {
        let ir = memory.read_u8(pc as usize).map_err(|e| e.at(pc))?;
        let opcode = match decode_opcode(ir) {
            Some(opcode) => opcode,
            None => return Err(VMError::UnknownOpcode { pc: pc, opcode: ir }),
        };

        let mut operands = [0u8; 2];
        for i in 0..operand_count(ir).min(operands.len()) {
            let addr = pc as usize + 1 + i;
            operands[i] = memory.read_u8(addr).map_err(|e| e.at(pc))?;
        }

        Ok(Instruction(opcode, operands[0], operands[1]))
    }

    /// Width of the instruction in memory, opcode byte included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        opcode_len(self.0 as u8)
    }

    /// Whether executing the instruction in the current CPU state ends with
    /// the generic advance past it rather than a transfer of control or a
    /// halt.
    pub fn falls_through(&self, cpu: &CPU) -> bool {
        use ls8::opcode::Opcode::*;

        match self.0 {
            HLT | CALL | RET | JMP => false,
            JEQ => !cpu.equal_flag_set(),
            JNE => cpu.equal_flag_set(),
            LDI | PRN | ADD | SUB | MUL | DIV | CMP | PUSH | POP => true,
        }
    }

    /// Performs the effect of the instruction. Every operand is validated
    /// before state is written so a faulting instruction leaves the machine
    /// untouched.
    pub fn execute<W: Write>(&self, cpu: &mut CPU, memory: &mut Memory, out: &mut W) -> VMResult<Flow> {
        use ls8::opcode::Opcode::*;

        let Instruction(opcode, a, b) = *self;
        match opcode {
            HLT => Ok(Flow::Halt),

            // Loads an immediate value into a register.
            LDI => {
                cpu.write_reg(a, b)?;
                Ok(Flow::Advance)
            },

            PRN => {
                let val = cpu.read_reg(a)?;
                writeln!(out, "{}", val)?;
                Ok(Flow::Advance)
            },

            ADD => self.arithmetic(cpu, AluOp::Add),
            SUB => self.arithmetic(cpu, AluOp::Sub),
            MUL => self.arithmetic(cpu, AluOp::Mul),
            DIV => self.arithmetic(cpu, AluOp::Div),

            CMP => {
                let ordering = alu::compare(cpu.read_reg(a)?, cpu.read_reg(b)?);
                cpu.set_compare_flags(ordering);
                Ok(Flow::Advance)
            },

            PUSH => {
                let val = cpu.read_reg(a)?;
                memory.stack_push_u8(cpu, val)?;
                Ok(Flow::Advance)
            },

            POP => {
                // Check the destination before the stack pointer moves.
                cpu.read_reg(a)?;
                let val = memory.stack_pop_u8(cpu)?;
                cpu.write_reg(a, val)?;
                Ok(Flow::Advance)
            },

            // Pushes the address of the following instruction and jumps to the
            // subroutine address held in the register.
            CALL => {
                let target = cpu.read_reg(a)?;
                let ret = cpu.pc as usize + self.len();
                if ret > u8::max_value() as usize {
                    return Err(VMError::AddressOutOfRange { pc: cpu.pc, address: ret });
                }
                memory.stack_push_u8(cpu, ret as u8)?;
                Ok(Flow::Jump(target))
            },

            RET => Ok(Flow::Jump(memory.stack_pop_u8(cpu)?)),

            JMP => Ok(Flow::Jump(cpu.read_reg(a)?)),

            JEQ => {
                let target = cpu.read_reg(a)?;
                Ok(if cpu.equal_flag_set() { Flow::Jump(target) } else { Flow::Advance })
            },

            JNE => {
                let target = cpu.read_reg(a)?;
                Ok(if cpu.equal_flag_set() { Flow::Advance } else { Flow::Jump(target) })
            },
        }
    }

    /// Shared body of the register-to-register arithmetic instructions. The
    /// result is stored in the first operand's register.
    fn arithmetic(&self, cpu: &mut CPU, op: AluOp) -> VMResult<Flow> {
        let Instruction(_, a, b) = *self;
        let result = match alu::apply(op, cpu.read_reg(a)?, cpu.read_reg(b)?) {
            Some(result) => result,
            None => return Err(VMError::DivisionByZero { pc: cpu.pc }),
        };
        cpu.write_reg(a, result)?;
        Ok(Flow::Advance)
    }

    /// Renders the instruction in assembly syntax.
    pub fn disassemble(&self) -> String {
        use ls8::opcode::Opcode::*;

        let Instruction(opcode, a, b) = *self;
        let name = opcode.mnemonic();
        match opcode {
            HLT | RET => String::from(name),
            PUSH | POP | PRN | CALL | JMP | JEQ | JNE => format!("{} R{}", name, a),
            LDI => format!("{} R{},{:#04X}", name, a, b),
            ADD | SUB | MUL | DIV | CMP => format!("{} R{},R{}", name, a, b),
        }
    }

    /// Formats a trace line with the instruction bytes and the CPU state as it
    /// was before the instruction ran.
    pub fn log(&self, cpu: &CPU) -> String {
        let regs: Vec<String> = cpu.reg.iter().map(|r| format!("{:02X}", r)).collect();
        format!("TRACE: {:02X} | {:02X} {:02X} {:02X} | {} | FL:{:02X}  {}",
                cpu.pc, self.0 as u8, self.1, self.2, regs.join(" "), cpu.fl,
                self.disassemble())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ls8::cpu::{EQUAL_FLAG, GREATER_THAN_FLAG, LESS_THAN_FLAG, SP, STACK_START};
    use ls8::ls8::LS8RuntimeOptions;

    fn machine(program: &[u8]) -> (CPU, Memory) {
        let mut memory = Memory::new();
        memory.load_program(program).unwrap();
        (CPU::new(LS8RuntimeOptions::default()), memory)
    }

    fn run_one(cpu: &mut CPU, memory: &mut Memory) -> VMResult<Flow> {
        let mut out: Vec<u8> = Vec::new();
        let instr = Instruction::parse(cpu.pc, memory)?;
        instr.execute(cpu, memory, &mut out)
    }

    #[test]
    fn parse_reads_only_declared_operands() {
        let (_, memory) = machine(&[0x47, 0x03, 0xEE]);
        let instr = Instruction::parse(0, &memory).unwrap();
        assert_eq!(instr, Instruction(Opcode::PRN, 0x03, 0x00));
        assert_eq!(instr.len(), 2);
    }

    #[test]
    fn parse_rejects_unknown_opcode() {
        let (_, memory) = machine(&[0xFF]);
        assert!(match Instruction::parse(0, &memory) {
            Err(VMError::UnknownOpcode { pc: 0, opcode: 0xFF }) => true,
            _ => false,
        });
    }

    #[test]
    fn parse_faults_on_operands_past_memory() {
        let mut memory = Memory::new();
        memory.write_u8(0xFF, Opcode::LDI as u8).unwrap();
        assert!(match Instruction::parse(0xFF, &memory) {
            Err(VMError::AddressOutOfRange { pc: 0xFF, address: 0x100 }) => true,
            _ => false,
        });
    }

    #[test]
    fn hlt_at_last_address_decodes() {
        let mut memory = Memory::new();
        memory.write_u8(0xFF, Opcode::HLT as u8).unwrap();
        assert!(Instruction::parse(0xFF, &memory).is_ok());
    }

    #[test]
    fn ldi_and_arithmetic() {
        let (mut cpu, mut memory) = machine(&[]);
        cpu.reg[0] = 255;
        cpu.reg[1] = 2;
        let instr = Instruction(Opcode::ADD, 0, 1);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(instr.execute(&mut cpu, &mut memory, &mut out).unwrap(), Flow::Advance);
        assert_eq!(cpu.reg[0], 1);
        assert_eq!(cpu.reg[1], 2);

        let instr = Instruction(Opcode::LDI, 2, 0x2A);
        instr.execute(&mut cpu, &mut memory, &mut out).unwrap();
        assert_eq!(cpu.reg[2], 0x2A);
    }

    #[test]
    fn div_by_zero_leaves_register_untouched() {
        let (mut cpu, mut memory) = machine(&[0xA3, 0x00, 0x01]);
        cpu.reg[0] = 9;
        assert!(match run_one(&mut cpu, &mut memory) {
            Err(VMError::DivisionByZero { pc: 0 }) => true,
            _ => false,
        });
        assert_eq!(cpu.reg[0], 9);
    }

    #[test]
    fn invalid_register_faults() {
        let (mut cpu, mut memory) = machine(&[0x82, 0x08, 0x01]);
        assert!(match run_one(&mut cpu, &mut memory) {
            Err(VMError::InvalidRegister { pc: 0, index: 8 }) => true,
            _ => false,
        });
    }

    #[test]
    fn cmp_sets_one_flag_and_is_idempotent() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        let cmp = Instruction(Opcode::CMP, 0, 1);
        for &(a, b, flag) in [(1u8, 2u8, LESS_THAN_FLAG), (2, 1, GREATER_THAN_FLAG), (3, 3, EQUAL_FLAG)].iter() {
            cpu.reg[0] = a;
            cpu.reg[1] = b;
            cmp.execute(&mut cpu, &mut memory, &mut out).unwrap();
            assert_eq!(cpu.fl, flag);
            cmp.execute(&mut cpu, &mut memory, &mut out).unwrap();
            assert_eq!(cpu.fl, flag);
        }
    }

    #[test]
    fn cmp_sets_exactly_one_flag_for_all_pairs() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        let cmp = Instruction(Opcode::CMP, 0, 1);
        for a in 0..256u16 {
            for b in 0..256u16 {
                cpu.reg[0] = a as u8;
                cpu.reg[1] = b as u8;
                cmp.execute(&mut cpu, &mut memory, &mut out).unwrap();
                assert_eq!(cpu.fl.count_ones(), 1);
            }
        }
    }

    #[test]
    fn prn_writes_decimal_line() {
        let (mut cpu, mut memory) = machine(&[]);
        cpu.reg[4] = 200;
        let mut out: Vec<u8> = Vec::new();
        Instruction(Opcode::PRN, 4, 0).execute(&mut cpu, &mut memory, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "200\n");
    }

    #[test]
    fn pop_into_invalid_register_keeps_stack_pointer() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        Instruction(Opcode::PUSH, 0, 0).execute(&mut cpu, &mut memory, &mut out).unwrap();
        let sp = cpu.reg[SP];
        assert!(Instruction(Opcode::POP, 9, 0).execute(&mut cpu, &mut memory, &mut out).is_err());
        assert_eq!(cpu.reg[SP], sp);
    }

    #[test]
    fn call_pushes_following_address() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        cpu.pc = 0x10;
        cpu.reg[1] = 0x40;
        let flow = Instruction(Opcode::CALL, 1, 0).execute(&mut cpu, &mut memory, &mut out).unwrap();
        assert_eq!(flow, Flow::Jump(0x40));
        assert_eq!(cpu.reg[SP], STACK_START - 1);
        assert_eq!(memory.read_u8(cpu.reg[SP] as usize), Ok(0x12));

        let flow = Instruction(Opcode::RET, 0, 0).execute(&mut cpu, &mut memory, &mut out).unwrap();
        assert_eq!(flow, Flow::Jump(0x12));
        assert_eq!(cpu.reg[SP], STACK_START);
    }

    #[test]
    fn call_from_last_bytes_faults() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        cpu.pc = 0xFE;
        assert!(match Instruction(Opcode::CALL, 0, 0).execute(&mut cpu, &mut memory, &mut out) {
            Err(VMError::AddressOutOfRange { pc: 0xFE, address: 0x100 }) => true,
            _ => false,
        });
        assert_eq!(cpu.reg[SP], STACK_START);
    }

    #[test]
    fn conditional_jumps_follow_equal_flag() {
        let (mut cpu, mut memory) = machine(&[]);
        let mut out: Vec<u8> = Vec::new();
        cpu.reg[2] = 0x30;
        cpu.fl = EQUAL_FLAG;
        assert_eq!(Instruction(Opcode::JEQ, 2, 0).execute(&mut cpu, &mut memory, &mut out).unwrap(), Flow::Jump(0x30));
        assert_eq!(Instruction(Opcode::JNE, 2, 0).execute(&mut cpu, &mut memory, &mut out).unwrap(), Flow::Advance);
        cpu.fl = LESS_THAN_FLAG;
        assert_eq!(Instruction(Opcode::JEQ, 2, 0).execute(&mut cpu, &mut memory, &mut out).unwrap(), Flow::Advance);
        assert_eq!(Instruction(Opcode::JNE, 2, 0).execute(&mut cpu, &mut memory, &mut out).unwrap(), Flow::Jump(0x30));
    }

    #[test]
    fn falls_through_unless_control_moves() {
        let mut cpu = CPU::new(LS8RuntimeOptions::default());
        assert!(Instruction(Opcode::LDI, 0, 1).falls_through(&cpu));
        assert!(Instruction(Opcode::PRN, 0, 0).falls_through(&cpu));
        assert!(!Instruction(Opcode::HLT, 0, 0).falls_through(&cpu));
        assert!(!Instruction(Opcode::JMP, 0, 0).falls_through(&cpu));
        assert!(!Instruction(Opcode::CALL, 0, 0).falls_through(&cpu));
        assert!(!Instruction(Opcode::RET, 0, 0).falls_through(&cpu));

        cpu.fl = EQUAL_FLAG;
        assert!(!Instruction(Opcode::JEQ, 0, 0).falls_through(&cpu));
        assert!(Instruction(Opcode::JNE, 0, 0).falls_through(&cpu));
        cpu.fl = GREATER_THAN_FLAG;
        assert!(Instruction(Opcode::JEQ, 0, 0).falls_through(&cpu));
        assert!(!Instruction(Opcode::JNE, 0, 0).falls_through(&cpu));
    }

    #[test]
    fn disassembly() {
        assert_eq!(Instruction(Opcode::LDI, 0, 8).disassemble(), "LDI R0,0x08");
        assert_eq!(Instruction(Opcode::MUL, 0, 1).disassemble(), "MUL R0,R1");
        assert_eq!(Instruction(Opcode::PRN, 3, 0).disassemble(), "PRN R3");
        assert_eq!(Instruction(Opcode::HLT, 0, 0).disassemble(), "HLT");
    }

    #[test]
    fn trace_line_shows_pc_bytes_and_registers() {
        let cpu = CPU::new(LS8RuntimeOptions::default());
        let line = Instruction(Opcode::LDI, 0, 8).log(&cpu);
        assert_eq!(line, "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4 | FL:00  LDI R0,0x08");
    }
}
