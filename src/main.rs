//! streamfold CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Prints errors to
//! stderr and exits non-zero on failure.

use streamfold::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
