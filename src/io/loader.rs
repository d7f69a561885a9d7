// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use ls8::memory::MEMORY_SIZE;
use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

// Everything after this character on a line is a comment.
const COMMENT_MARKER: char = '#';

/// Errors that stop a program image from ever reaching memory.
#[derive(Debug)]
pub enum LoadError {
    NotFound(PathBuf),
    Io(io::Error),
    InvalidLine { line: usize, text: String },
    TooLarge { len: usize },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LoadError::NotFound(ref path) => write!(f, "{} not found", path.display()),
            LoadError::Io(ref e) => write!(f, "unable to read program: {}", e),
            LoadError::InvalidLine { line, ref text } =>
                write!(f, "line {}: {:?} is not an 8-bit binary number", line, text),
            LoadError::TooLarge { len } =>
                write!(f, "program is {} bytes but memory holds {}", len, MEMORY_SIZE),
        }
    }
}

impl error::Error for LoadError {}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> LoadError {
        LoadError::Io(e)
    }
}

/// Reads a program file at a given path and parses it into a memory image.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, LoadError> {
    let path = path.as_ref();
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::NotFound(path.to_path_buf()));
        },
        Err(e) => return Err(LoadError::Io(e)),
    };

    let mut text = String::new();
    file.read_to_string(&mut text)?;
    parse_program(&text)
}

/// Parses the textual program format. Each line holds at most one byte written
/// in binary, optionally followed by a comment. Blank and comment-only lines
/// are skipped.
pub fn parse_program(text: &str) -> Result<Vec<u8>, LoadError> {
    let mut program: Vec<u8> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let code = match line.find(COMMENT_MARKER) {
            Some(pos) => &line[..pos],
            None => line,
        }.trim();

        if code.is_empty() {
            continue;
        }

        match u8::from_str_radix(code, 2) {
            Ok(byte) => program.push(byte),
            Err(_) => {
                return Err(LoadError::InvalidLine {
                    line: idx + 1,
                    text: String::from(code),
                });
            },
        }
    }

    if program.len() > MEMORY_SIZE {
        return Err(LoadError::TooLarge { len: program.len() });
    }

    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# print8.ls8\n\
                    10000010 # LDI R0,8\n\
                    00000000\n\
                    00001000\n\
                    \n\
                    01000111 # PRN R0\n\
                    00000000\n\
                    00000001 # HLT\n";
        let program = parse_program(text).unwrap();
        assert_eq!(program, vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let program = parse_program("   00000001   \t# HLT").unwrap();
        assert_eq!(program, vec![0x01]);
    }

    #[test]
    fn rejects_non_binary_lines() {
        match parse_program("00000001\n00000012\n") {
            Err(LoadError::InvalidLine { line, text }) => {
                assert_eq!(line, 2);
                assert_eq!(text, "00000012");
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_values_wider_than_a_byte() {
        assert!(match parse_program("100000000") {
            Err(LoadError::InvalidLine { line: 1, .. }) => true,
            _ => false,
        });
    }

    #[test]
    fn rejects_programs_larger_than_memory() {
        let text = "00000000\n".repeat(MEMORY_SIZE + 1);
        assert!(match parse_program(&text) {
            Err(LoadError::TooLarge { len }) => len == MEMORY_SIZE + 1,
            _ => false,
        });
    }

    #[test]
    fn accepts_programs_filling_memory() {
        let text = "00000000\n".repeat(MEMORY_SIZE);
        assert_eq!(parse_program(&text).unwrap().len(), MEMORY_SIZE);
    }

    #[test]
    fn missing_file_is_not_found() {
        assert!(match load_program("tests/programs/does-not-exist.ls8") {
            Err(LoadError::NotFound(_)) => true,
            _ => false,
        });
    }
}
