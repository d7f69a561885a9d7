// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use enum_primitive::FromPrimitive;

// The two high bits of every instruction byte hold the number of operand bytes
// that follow it.
const OPERAND_COUNT_SHIFT: u8 = 6;
const OPERAND_COUNT_MASK : u8 = 0b11;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        HLT  = 0b00000001,
        RET  = 0b00010001,

        PUSH = 0b01000101,
        POP  = 0b01000110,
        PRN  = 0b01000111,
        CALL = 0b01010000,
        JMP  = 0b01010100,
        JEQ  = 0b01010101,
        JNE  = 0b01010110,

        LDI  = 0b10000010,
        ADD  = 0b10100000,
        SUB  = 0b10100001,
        MUL  = 0b10100010,
        DIV  = 0b10100011,
        CMP  = 0b10100111,
    }
}

/// Decodes an opcode by converting an opcode number to an enum value. Returns
/// `None` for bytes that aren't part of the instruction set.
pub fn decode_opcode(opcode: u8) -> Option<Opcode> {
    Opcode::from_u8(opcode)
}

/// Number of operand bytes following an instruction byte. This is derived from
/// the encoding alone so it works for bytes the CPU doesn't implement.
#[inline(always)]
pub fn operand_count(opcode: u8) -> usize {
    ((opcode >> OPERAND_COUNT_SHIFT) & OPERAND_COUNT_MASK) as usize
}

/// Determine the length of an instruction with the given opcode, including the
/// opcode byte itself.
#[inline(always)]
pub fn opcode_len(opcode: u8) -> usize {
    operand_count(opcode) + 1
}

impl Opcode {
    /// Assembly mnemonic of the opcode.
    pub fn mnemonic(&self) -> &'static str {
        use self::Opcode::*;

        match *self {
            HLT  => "HLT",
            RET  => "RET",
            PUSH => "PUSH",
            POP  => "POP",
            PRN  => "PRN",
            CALL => "CALL",
            JMP  => "JMP",
            JEQ  => "JEQ",
            JNE  => "JNE",
            LDI  => "LDI",
            ADD  => "ADD",
            SUB  => "SUB",
            MUL  => "MUL",
            DIV  => "DIV",
            CMP  => "CMP",
        }
    }
}
