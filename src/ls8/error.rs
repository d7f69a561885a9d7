// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use io::errors::{EXIT_INVALID_PROGRAM, EXIT_RUNTIME_FAILURE, EXIT_UNKNOWN_OPCODE};
use std::error;
use std::fmt;
use std::io;

/// Fatal conditions raised by the machine. None of them are recoverable: the
/// run stops and the error is handed back to whoever started it. Runtime
/// faults carry the address of the instruction that caused them.
#[derive(Debug)]
pub enum VMError {
    ProgramTooLarge { len: usize },
    UnknownOpcode { pc: u8, opcode: u8 },
    DivisionByZero { pc: u8 },
    AddressOutOfRange { pc: u8, address: usize },
    InvalidRegister { pc: u8, index: u8 },
    StackOverflow { pc: u8 },
    StackUnderflow { pc: u8 },
    Output(io::Error),
}

pub type VMResult<T> = Result<T, VMError>;

impl VMError {
    /// Process exit code the command-line front end should stop with.
    pub fn exit_code(&self) -> i32 {
        match *self {
            VMError::ProgramTooLarge { .. } => EXIT_INVALID_PROGRAM,
            VMError::UnknownOpcode { .. } => EXIT_UNKNOWN_OPCODE,
            _ => EXIT_RUNTIME_FAILURE,
        }
    }
}

impl fmt::Display for VMError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            VMError::ProgramTooLarge { len } =>
                write!(f, "program of {} bytes does not fit in memory", len),
            VMError::UnknownOpcode { pc, opcode } =>
                write!(f, "unknown opcode {:#04X} ({:08b}) at {:#04X}", opcode, opcode, pc),
            VMError::DivisionByZero { pc } =>
                write!(f, "division by zero at {:#04X}", pc),
            VMError::AddressOutOfRange { pc, address } =>
                write!(f, "address {:#X} out of range at {:#04X}", address, pc),
            VMError::InvalidRegister { pc, index } =>
                write!(f, "register R{} does not exist at {:#04X}", index, pc),
            VMError::StackOverflow { pc } =>
                write!(f, "stack overflow below address 0x00 at {:#04X}", pc),
            VMError::StackUnderflow { pc } =>
                write!(f, "stack underflow past address 0xFF at {:#04X}", pc),
            VMError::Output(ref e) =>
                write!(f, "unable to write output: {}", e),
        }
    }
}

impl error::Error for VMError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            VMError::Output(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for VMError {
    fn from(e: io::Error) -> VMError {
        VMError::Output(e)
    }
}
