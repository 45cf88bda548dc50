//! CLI argument parsing: an optional source file and a repeated `-v` flag
//! rather than a `ValueEnum`, since there is no subcommand tree here to
//! hang one off.

use std::path::PathBuf;

use clap::Parser;

/// The Tourmaline interpreter.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a `.trm` source file. Omit to start an interactive REPL.
    #[arg(index = 1)]
    pub file: Option<PathBuf>,

    /// Increase log verbosity; repeat for more detail (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
