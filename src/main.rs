//! Entry point: parse CLI, initialise logging, then either run a `.trm`
//! file once or drive a line-at-a-time REPL.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use log::{error, info};

use tourmaline::cli::Cli;
use tourmaline::error::TourmalineError;
use tourmaline::Interpreter;

const EXIT_OK: u8 = 0;
const EXIT_BAD_INVOCATION: u8 = 1;
const EXIT_PROGRAM_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = Cli::init();
    simple_logger::SimpleLogger::new()
        .with_level(args.log_level())
        .init()
        .expect("logger is only initialised once");

    let outcome = std::panic::catch_unwind(|| match &args.file {
        Some(path) => run_file(path),
        None => run_repl(),
    });

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown host error".to_string());
            error!("internal error: {message}");
            ExitCode::from(EXIT_PROGRAM_ERROR)
        }
    }
}

fn run_file(path: &Path) -> u8 {
    if path.extension().and_then(|ext| ext.to_str()) != Some("trm") {
        error!("refusing to run '{}': expected a '.trm' file", path.display());
        return EXIT_BAD_INVOCATION;
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(io_err) => {
            error!("could not read '{}': {io_err}", path.display());
            return EXIT_BAD_INVOCATION;
        }
    };

    info!("running {}", path.display());
    let mut interp = Interpreter::with_stdio();
    match interp.run_source(&source) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            report(&err);
            EXIT_PROGRAM_ERROR
        }
    }
}

fn run_repl() -> u8 {
    let mut interp = Interpreter::with_stdio();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!(">>> ");
        if io::stdout().flush().is_err() {
            return EXIT_PROGRAM_ERROR;
        }

        line.clear();
        let read = stdin.lock().read_line(&mut line);
        match read {
            Ok(0) => return EXIT_OK,
            Ok(_) => {}
            Err(io_err) => {
                error!("could not read from stdin: {io_err}");
                return EXIT_PROGRAM_ERROR;
            }
        }

        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return EXIT_OK;
        }
        if trimmed.is_empty() {
            continue;
        }

        if let Err(err) = interp.run_source(trimmed) {
            report(&err);
        }
    }
}

fn report(err: &TourmalineError) {
    error!("{err}");
}
