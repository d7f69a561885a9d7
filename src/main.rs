// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

extern crate getopts;
extern crate ls8;

use getopts::Options;
use ls8::debugger::debugger::Debugger;
use ls8::io::errors::{EXIT_FAILURE, EXIT_INVALID_PROGRAM, EXIT_PROGRAM_NOT_FOUND, EXIT_SUCCESS};
use ls8::io::loader::{self, LoadError};
use ls8::io::log;
use ls8::ls8::ls8::{LS8, LS8RuntimeOptions};
use std::env;
use std::io;

/// Prints usage information for the emulator along with the available options.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] PROGRAM", program);
    print!("{}", opts.usage(&brief));
}

/// Initializes and starts the emulator. Returns an exit code after which the
/// program unwinds and stops executing.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optflag("v", "verbose", "log every executed instruction");
    opts.optflag("d", "debug", "start the interactive debugger");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            return EXIT_FAILURE;
        },
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return EXIT_SUCCESS;
    }

    let path = match matches.free.first() {
        Some(path) => path.clone(),
        None => {
            print_usage(&program, &opts);
            return EXIT_FAILURE;
        },
    };

    let runtime_options = LS8RuntimeOptions {
        verbose: matches.opt_present("v"),
        debug: matches.opt_present("d"),
    };

    let image = match loader::load_program(&path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            return match e {
                LoadError::NotFound(_) => EXIT_PROGRAM_NOT_FOUND,
                LoadError::Io(_) => EXIT_FAILURE,
                _ => EXIT_INVALID_PROGRAM,
            };
        },
    };

    let mut ls8 = LS8::new(runtime_options);
    if let Err(e) = ls8.load(&image) {
        eprintln!("{}: {}", program, e);
        return e.exit_code();
    }
    log::log("main", format!("Running {}", path), &runtime_options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if runtime_options.debug {
        Debugger::new().run(&mut ls8, &mut out)
    } else {
        ls8.run(&mut out)
    };

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", program, e);
            eprintln!("{}", ls8.cpu);
            e.exit_code()
        },
    }
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code); // Unwinding done, safe to exit.
}
