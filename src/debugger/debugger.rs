// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use debugger::parser;
use io::log;
use ls8::error::{VMError, VMResult};
use ls8::instruction::Instruction;
use ls8::ls8::LS8;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::BTreeSet;
use std::io::{self, Write};

const PROMPT: &'static str = "(ls8) ";

// Bytes shown by a dump without an explicit length, and per output row.
const DEFAULT_DUMP_LEN: usize = 0x40;
const DUMP_ROW_LEN    : usize = 0x10;

#[derive(Debug, PartialEq)]
enum Command {
    Step,
    Continue,
    Break,
    Registers,
    Dump,
    Quit,
}

struct CommandWithArguments {
    command: Command,
    args: Vec<String>,
}

/// Whether the prompt keeps going after a command.
#[derive(Debug, PartialEq)]
pub enum Session {
    Active,
    Finished,
}

pub struct Debugger {
    breakpoints: BTreeSet<u8>,

    // The first fault hit while debugging. The machine stays where it faulted
    // so its state can be inspected.
    fault: Option<VMError>,
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            breakpoints: BTreeSet::new(),
            fault: None,
        }
    }

    /// Reads commands from the terminal until the user quits or closes input.
    /// Program output goes to `out`. Returns the fault the program stopped on,
    /// if any.
    pub fn run<W: Write>(mut self, ls8: &mut LS8, out: &mut W) -> VMResult<()> {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                return Err(VMError::Output(io::Error::new(io::ErrorKind::Other, e.to_string())));
            },
        };

        loop {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if let Err(e) = editor.add_history_entry(line.as_str()) {
                        eprintln!("ls8: {}", e);
                    }
                    if self.handle(&line, ls8, out) == Session::Finished {
                        break;
                    }
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("ls8: {}", e);
                    break;
                },
            }
        }

        match self.fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Interprets and executes one line of debugger input.
    pub fn handle<W: Write>(&mut self, input: &str, ls8: &mut LS8, out: &mut W) -> Session {
        match self.interpret(input) {
            Some(command) => self.execute_command(command, ls8, out),
            None => Session::Active,
        }
    }

    /// Parse a raw input string into a list of arguments and a command. This
    /// function also maps command names to their respective enums.
    fn interpret(&self, input: &str) -> Option<CommandWithArguments> {
        let args = match parser::parse_raw_input(input) {
            Ok(args) => args,
            Err(e) => {
                eprintln!("ls8: {}", e);
                return None;
            },
        };

        let command = {
            let raw_command = match args.first() {
                Some(raw_command) => raw_command,
                None => return None,
            };

            // Map command strings to the command enum type.
            match raw_command.to_lowercase().as_str() {
                // Full commands.
                "step"     => Command::Step,
                "continue" => Command::Continue,
                "break"    => Command::Break,
                "regs"     => Command::Registers,
                "dump"     => Command::Dump,
                "quit"     => Command::Quit,
                // Aliases.
                "s" => Command::Step,
                "c" => Command::Continue,
                "b" => Command::Break,
                "r" => Command::Registers,
                "d" => Command::Dump,
                "q" => Command::Quit,
                // Unknown command.
                _ => {
                    eprintln!("ls8: unknown command {:?}", raw_command);
                    return None;
                },
            }
        };

        Some(CommandWithArguments {
            command: command,
            args: args,
        })
    }

    /// Executes the correct debugger command based on the enum passed.
    fn execute_command<W: Write>(&mut self, command: CommandWithArguments, ls8: &mut LS8, out: &mut W) -> Session {
        match command.command {
            Command::Step => self.execute_step(ls8, out, &command.args),
            Command::Continue => self.execute_continue(ls8, out),
            Command::Break => self.execute_break(&command.args),
            Command::Registers => println!("{}", ls8.cpu),
            Command::Dump => self.execute_dump(ls8, &command.args),
            Command::Quit => return Session::Finished,
        };
        Session::Active
    }

    /// Numeric argument at `idx`, or `default` when it wasn't given.
    fn number_arg(args: &[String], idx: usize, default: usize) -> Option<usize> {
        match args.get(idx) {
            Some(arg) => match parser::parse_number(arg) {
                Ok(n) => Some(n),
                Err(e) => {
                    eprintln!("ls8: {}: {:?}", e, arg);
                    None
                },
            },
            None => Some(default),
        }
    }

    /// Runs a single instruction and reports a fault if one occurred. Returns
    /// false once the machine can't make progress anymore.
    fn single_step<W: Write>(&mut self, ls8: &mut LS8, out: &mut W) -> bool {
        if self.fault.is_some() {
            eprintln!("ls8: the program faulted and can't continue");
            return false;
        }
        if ls8.halted() {
            println!("Program halted");
            return false;
        }

        if let Ok(instr) = Instruction::parse(ls8.cpu.pc, &ls8.memory) {
            println!("{:#04X}  {}", ls8.cpu.pc, instr.disassemble());
        }
        match ls8.step(out) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("ls8: {}", e);
                self.fault = Some(e);
                false
            },
        }
    }

    /// Steps the CPU forward one or more instructions.
    fn execute_step<W: Write>(&mut self, ls8: &mut LS8, out: &mut W, args: &[String]) {
        let count = match Debugger::number_arg(args, 1, 1) {
            Some(count) => count,
            None => return,
        };
        for _ in 0..count {
            if !self.single_step(ls8, out) {
                break;
            }
        }
    }

    /// Runs until the program halts, faults, or reaches a breakpoint. The
    /// instruction under the program counter always executes so continuing
    /// from a breakpoint makes progress.
    fn execute_continue<W: Write>(&mut self, ls8: &mut LS8, out: &mut W) {
        log::log("debugger", "Starting execution now...", &ls8.runtime_options);
        while self.single_step(ls8, out) {
            if self.breakpoints.contains(&ls8.cpu.pc) {
                println!("Breakpoint reached at {:#04X}", ls8.cpu.pc);
                break;
            }
        }
    }

    /// Toggles a breakpoint at an address, or lists breakpoints when no address
    /// is given.
    fn execute_break(&mut self, args: &[String]) {
        if args.len() < 2 {
            for addr in self.breakpoints.iter() {
                println!("Breakpoint at {:#04X}", addr);
            }
            return;
        }

        let addr = match Debugger::number_arg(args, 1, 0) {
            Some(addr) if addr <= u8::max_value() as usize => addr as u8,
            Some(addr) => {
                eprintln!("ls8: address {:#X} is outside of memory", addr);
                return;
            },
            None => return,
        };
        if !self.breakpoints.remove(&addr) {
            self.breakpoints.insert(addr);
        }
    }

    /// Dumps memory as rows of hex bytes, starting at the program counter when
    /// no address is given.
    fn execute_dump(&mut self, ls8: &mut LS8, args: &[String]) {
        let pc = ls8.cpu.pc as usize;
        let (addr, len) = match (Debugger::number_arg(args, 1, pc),
                                 Debugger::number_arg(args, 2, DEFAULT_DUMP_LEN)) {
            (Some(addr), Some(len)) => (addr, len),
            _ => return,
        };
        for line in format_dump(addr, ls8.memory.slice(addr, len)) {
            println!("{}", line);
        }
    }

    pub fn breakpoints(&self) -> &BTreeSet<u8> {
        &self.breakpoints
    }
}

/// Formats bytes read from `addr` onwards as `ADDR: XX XX ..` rows.
pub fn format_dump(addr: usize, bytes: &[u8]) -> Vec<String> {
    bytes.chunks(DUMP_ROW_LEN).enumerate().map(|(i, row)| {
        let hex: Vec<String> = row.iter().map(|b| format!("{:02X}", b)).collect();
        format!("{:02X}: {}", addr + i * DUMP_ROW_LEN, hex.join(" "))
    }).collect()
}
