// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

enum ParseState {
    ScanningForArguments,
    ScanningArgument,
    ScanningQuotedArgument,
}

/// Returns true if the character passed is a whitespace character. Both spaces
/// and tabs are considered whitespace characters.
fn is_whitespace(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if the character passed is a quote.
fn is_quote(c: char) -> bool {
    c == '"'
}

/// Parses raw debugger input into a list of separate arguments. Arguments are
/// separated by whitespace and can be quoted to keep whitespace inside them.
pub fn parse_raw_input(input: &str) -> Result<Vec<String>, &'static str> {
    let mut state = ParseState::ScanningForArguments;
    let mut args: Vec<String> = Vec::new();
    let mut arg = String::new();

    for c in input.trim_end_matches(|c: char| c == '\n' || c == '\r').chars() {
        match state {
            ParseState::ScanningForArguments => {
                // Determine a scanning state depending on the first
                // non-whitespace character.
                if is_quote(c) {
                    state = ParseState::ScanningQuotedArgument;
                } else if !is_whitespace(c) {
                    arg.push(c);
                    state = ParseState::ScanningArgument;
                }
            },
            ParseState::ScanningArgument => {
                // Switch back to scanning if whitespace is encountered and push
                // the argument currently being parsed to the argument list.
                if is_whitespace(c) {
                    args.push(arg.split_off(0));
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            },
            ParseState::ScanningQuotedArgument => {
                if is_quote(c) {
                    args.push(arg.split_off(0));
                    state = ParseState::ScanningForArguments;
                } else {
                    arg.push(c);
                }
            },
        }
    }

    match state {
        ParseState::ScanningForArguments => {},
        ParseState::ScanningArgument => args.push(arg),
        ParseState::ScanningQuotedArgument => return Err("quoted arg does not close"),
    }

    Ok(args)
}

/// Parses a numeric debugger argument. Hex (0x) and binary (0b) prefixes are
/// accepted, otherwise the number is read as decimal.
pub fn parse_number(arg: &str) -> Result<usize, &'static str> {
    let lower = arg.to_lowercase();
    let parsed = if lower.starts_with("0x") {
        usize::from_str_radix(&lower[2..], 16)
    } else if lower.starts_with("0b") {
        usize::from_str_radix(&lower[2..], 2)
    } else {
        lower.parse::<usize>()
    };
    parsed.map_err(|_| "invalid number")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(parse_raw_input("dump  0x10\t8\n").unwrap(), vec!["dump", "0x10", "8"]);
    }

    #[test]
    fn keeps_quoted_whitespace() {
        assert_eq!(parse_raw_input("break \"a b\" c").unwrap(), vec!["break", "a b", "c"]);
        assert_eq!(parse_raw_input("\"\"").unwrap(), vec![""]);
    }

    #[test]
    fn empty_input_has_no_arguments() {
        assert!(parse_raw_input("   ").unwrap().is_empty());
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(parse_raw_input("dump \"0x10").is_err());
    }

    #[test]
    fn numbers_in_all_radixes() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("0xF4"), Ok(0xF4));
        assert_eq!(parse_number("0b101"), Ok(5));
        assert!(parse_number("zz").is_err());
    }
}
